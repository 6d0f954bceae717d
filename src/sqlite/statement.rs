use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use rusqlite::Connection as RusqliteConnection;
use rusqlite::types::Value;

use super::types::{SqliteType, cell_from_value_ref, to_sqlite_value};
use crate::adapter::{ColumnDescriptor, DriverStatement, ExecuteOutcome};
use crate::error::SqlDbdError;
use crate::marshal::NativeCell;
use crate::types::DbValue;

/// Prepared `SQLite` statement.
///
/// The compiled statement lives in rusqlite's per-connection cache and is checked out
/// for each execute; result rows are read into a buffer before the checkout ends.
/// A step error after the first row is held back and reported by the fetch that
/// reaches it, so only the first step can fail `execute`.
pub struct SqliteStatement {
    conn: Weak<RusqliteConnection>,
    sql: String,
    param_count: usize,
    columns: Vec<ColumnDescriptor>,
    binds: Vec<Value>,
    cursor: Option<VecDeque<Vec<NativeCell>>>,
    deferred_error: Option<String>,
    changes: u64,
}

impl SqliteStatement {
    /// Compile `sql` once to validate it and capture its shape.
    ///
    /// # Errors
    /// `SqlDbdError::PrepareFailed` with `SQLite`'s diagnostic.
    pub fn prepare(conn: &Rc<RusqliteConnection>, sql: &str) -> Result<Self, SqlDbdError> {
        let stmt = conn
            .prepare_cached(sql)
            .map_err(|e| SqlDbdError::PrepareFailed(e.to_string()))?;
        let param_count = stmt.parameter_count();
        let columns = stmt
            .column_names()
            .into_iter()
            .map(|name| ColumnDescriptor::new(name, SqliteType::Dynamic))
            .collect();

        Ok(Self {
            conn: Rc::downgrade(conn),
            sql: sql.to_string(),
            param_count,
            columns,
            binds: vec![Value::Null; param_count],
            cursor: None,
            deferred_error: None,
            changes: 0,
        })
    }

    fn run(&mut self, conn: &RusqliteConnection) -> Result<ExecuteOutcome, rusqlite::Error> {
        let mut stmt = conn.prepare_cached(&self.sql)?;
        for (idx, value) in self.binds.iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, value)?;
        }

        if self.columns.is_empty() {
            let changes = stmt.raw_execute()?;
            self.changes = changes as u64;
            return Ok(ExecuteOutcome { has_rows: false });
        }

        let width = self.columns.len();
        let mut buffered = VecDeque::new();
        let mut rows = stmt.raw_query();
        loop {
            let step = rows.next().and_then(|row| {
                row.map(|row| {
                    (0..width)
                        .map(|idx| row.get_ref(idx).map(cell_from_value_ref))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()
            });
            match step {
                Ok(Some(cells)) => buffered.push_back(cells),
                Ok(None) => break,
                Err(err) if buffered.is_empty() => return Err(err),
                Err(err) => {
                    self.deferred_error = Some(err.to_string());
                    break;
                }
            }
        }
        drop(rows);

        // Reads leave the previous statement's count in place; RETURNING writes
        // are complete once their rows are drained.
        self.changes = if stmt.readonly() { 0 } else { conn.changes() };
        self.cursor = Some(buffered);
        Ok(ExecuteOutcome { has_rows: true })
    }
}

impl DriverStatement for SqliteStatement {
    fn param_count(&self) -> usize {
        self.param_count
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
        *slot = to_sqlite_value(value);
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.binds.fill(Value::Null);
    }

    fn execute(&mut self) -> Result<ExecuteOutcome, SqlDbdError> {
        let conn = self.conn.upgrade().ok_or(SqlDbdError::DbUnavailable)?;
        self.cursor = None;
        self.deferred_error = None;
        self.changes = 0;
        self.run(&conn)
            .map_err(|e| SqlDbdError::ExecuteFailed(e.to_string()))
    }

    fn fetch_row(&mut self) -> Result<Option<Vec<NativeCell>>, SqlDbdError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        if let Some(cells) = cursor.pop_front() {
            return Ok(Some(cells));
        }
        match self.deferred_error.take() {
            Some(message) => Err(SqlDbdError::FetchFailed(message)),
            None => Ok(None),
        }
    }

    fn free_cursor(&mut self) {
        self.cursor = None;
        self.deferred_error = None;
    }

    fn affected_rows(&self) -> Result<u64, SqlDbdError> {
        Ok(self.changes)
    }

    fn row_count(&self) -> Result<u64, SqlDbdError> {
        Err(SqlDbdError::not_implemented("sqlite", "rowcount"))
    }

    fn close(&mut self) {
        self.cursor = None;
        self.binds.clear();
        if let Some(conn) = self.conn.upgrade() {
            conn.flush_prepared_statement_cache();
        }
    }
}
