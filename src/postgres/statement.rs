use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use super::connection::PgSession;
use super::pg_message;
use super::types::{PgType, cell_from_row};
use crate::adapter::{ColumnDescriptor, DriverStatement, ExecuteOutcome};
use crate::error::SqlDbdError;
use crate::marshal::NativeCell;
use crate::types::DbValue;

/// Server-side prepared statement.
///
/// Parameter and column types come from the server at prepare time; bound values are
/// converted to those types when the statement executes.
pub struct PostgresStatement {
    session: Weak<PgSession>,
    statement: Option<tokio_postgres::Statement>,
    tags: Vec<PgType>,
    columns: Vec<ColumnDescriptor>,
    binds: Vec<DbValue>,
    cursor: Option<VecDeque<Row>>,
    row_count: u64,
    affected: u64,
}

impl PostgresStatement {
    /// # Errors
    /// `SqlDbdError::PrepareFailed` with the server's diagnostic.
    pub(crate) fn prepare(session: &Rc<PgSession>, sql: &str) -> Result<Self, SqlDbdError> {
        let statement = session
            .block_on(session.client.prepare(sql))
            .map_err(|e| SqlDbdError::PrepareFailed(pg_message(&e)))?;

        let tags: Vec<PgType> = statement
            .columns()
            .iter()
            .map(|col| PgType::from_type(col.type_()))
            .collect();
        let columns = statement
            .columns()
            .iter()
            .zip(&tags)
            .map(|(col, tag)| ColumnDescriptor::new(col.name(), *tag))
            .collect();
        let param_count = statement.params().len();

        Ok(Self {
            session: Rc::downgrade(session),
            statement: Some(statement),
            tags,
            columns,
            binds: vec![DbValue::Nil; param_count],
            cursor: None,
            row_count: 0,
            affected: 0,
        })
    }
}

impl DriverStatement for PostgresStatement {
    fn param_count(&self) -> usize {
        self.binds.len()
    }

    fn describe(&mut self) -> Result<Option<Vec<ColumnDescriptor>>, SqlDbdError> {
        Ok(Some(self.columns.clone()))
    }

    fn bind(&mut self, index: usize, value: &DbValue) -> Result<(), SqlDbdError> {
        let slot = index
            .checked_sub(1)
            .and_then(|idx| self.binds.get_mut(idx))
            .ok_or_else(|| {
                SqlDbdError::BindingFailed(format!("parameter index {index} out of range"))
            })?;
        *slot = value.clone();
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.binds.fill(DbValue::Nil);
    }

    fn execute(&mut self) -> Result<ExecuteOutcome, SqlDbdError> {
        let session = self.session.upgrade().ok_or(SqlDbdError::DbUnavailable)?;
        let statement = self
            .statement
            .as_ref()
            .ok_or(SqlDbdError::InvalidStatement)?;
        self.cursor = None;

        let params: Vec<&(dyn ToSql + Sync)> = self
            .binds
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect();
        let classify = |e: tokio_postgres::Error| {
            let message = pg_message(&e);
            if message.starts_with("error serializing parameter") {
                SqlDbdError::BindingFailed(message)
            } else {
                SqlDbdError::ExecuteFailed(message)
            }
        };

        if self.columns.is_empty() {
            let affected = session
                .block_on(session.client.execute(statement, &params))
                .map_err(classify)?;
            self.affected = affected;
            self.row_count = 0;
            return Ok(ExecuteOutcome { has_rows: false });
        }

        let rows = session
            .block_on(session.client.query(statement, &params))
            .map_err(classify)?;
        self.row_count = rows.len() as u64;
        self.affected = self.row_count;
        self.cursor = Some(rows.into());
        Ok(ExecuteOutcome { has_rows: true })
    }

    fn fetch_row(&mut self) -> Result<Option<Vec<NativeCell>>, SqlDbdError> {
        let Some(row) = self.cursor.as_mut().and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        self.tags
            .iter()
            .enumerate()
            .map(|(idx, tag)| cell_from_row(&row, idx, *tag))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn free_cursor(&mut self) {
        self.cursor = None;
    }

    fn affected_rows(&self) -> Result<u64, SqlDbdError> {
        Ok(self.affected)
    }

    fn row_count(&self) -> Result<u64, SqlDbdError> {
        Ok(self.row_count)
    }

    fn close(&mut self) {
        self.cursor = None;
        // Dropping the handle queues the server-side close on the client.
        self.statement = None;
    }
}
