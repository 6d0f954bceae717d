use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use duckdb::Connection as DuckConnection;
use duckdb::types::Value;

use super::types::{DuckDbType, cell_from_value_ref, to_duckdb_value};
use crate::adapter::{ColumnDescriptor, DriverStatement, ExecuteOutcome};
use crate::error::SqlDbdError;
use crate::marshal::NativeCell;
use crate::types::DbValue;

/// Prepared `DuckDB` statement.
///
/// Column metadata is captured from the first execution; `describe` returns `None`
/// before that.
pub struct DuckDbStatement {
    conn: Weak<DuckConnection>,
    sql: String,
    param_count: usize,
    columns: Option<Vec<ColumnDescriptor>>,
    binds: Vec<Value>,
    cursor: Option<VecDeque<Vec<NativeCell>>>,
    changes: u64,
}

impl DuckDbStatement {
    /// # Errors
    /// `SqlDbdError::PrepareFailed` with `DuckDB`'s diagnostic.
    pub fn prepare(conn: &Rc<DuckConnection>, sql: &str) -> Result<Self, SqlDbdError> {
        let stmt = conn
            .prepare_cached(sql)
            .map_err(|e| SqlDbdError::PrepareFailed(e.to_string()))?;
        let param_count = stmt.parameter_count();
        Ok(Self {
            conn: Rc::downgrade(conn),
            sql: sql.to_string(),
            param_count,
            columns: None,
            binds: vec![Value::Null; param_count],
            cursor: None,
            changes: 0,
        })
    }

    fn run(&mut self, conn: &DuckConnection) -> Result<ExecuteOutcome, duckdb::Error> {
        let mut stmt = conn.prepare_cached(&self.sql)?;
        for (idx, value) in self.binds.iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, value)?;
        }
        let changes = stmt.raw_execute()?;

        let width = stmt.column_count();
        if self.columns.is_none() {
            let columns = (0..width)
                .map(|idx| {
                    let name = stmt.column_name(idx).map_or("?", |n| n.as_str());
                    let tag = DuckDbType::from_column(
                        stmt.column_logical_type(idx).id(),
                        &stmt.column_type(idx),
                    );
                    ColumnDescriptor::new(name, tag)
                })
                .collect();
            self.columns = Some(columns);
        }

        if width == 0 {
            self.changes = changes as u64;
            return Ok(ExecuteOutcome { has_rows: false });
        }

        let mut buffered = VecDeque::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(cell_from_value_ref(row.get_ref(idx)?));
            }
            buffered.push_back(cells);
        }
        // DML with RETURNING yields one row per changed row and no separate count.
        self.changes = if is_data_modifying(&self.sql) {
            (changes as u64).max(buffered.len() as u64)
        } else {
            0
        };
        self.cursor = Some(buffered);
        Ok(ExecuteOutcome { has_rows: true })
    }
}

fn is_data_modifying(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    ["insert", "update", "delete"]
        .iter()
        .any(|dml| keyword.eq_ignore_ascii_case(dml))
}

impl DriverStatement for DuckDbStatement {
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn describe(&mut self) -> Result<Option<Vec<ColumnDescriptor>>, SqlDbdError> {
        Ok(self.columns.clone())
    }

    fn bind(&mut self, index: usize, value: &DbValue) -> Result<(), SqlDbdError> {
        let slot = index
            .checked_sub(1)
            .and_then(|idx| self.binds.get_mut(idx))
            .ok_or_else(|| {
                SqlDbdError::BindingFailed(format!("parameter index {index} out of range"))
            })?;
        *slot = to_duckdb_value(value);
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.binds.fill(Value::Null);
    }

    fn execute(&mut self) -> Result<ExecuteOutcome, SqlDbdError> {
        let conn = self.conn.upgrade().ok_or(SqlDbdError::DbUnavailable)?;
        self.cursor = None;
        self.changes = 0;
        self.run(&conn)
            .map_err(|e| SqlDbdError::ExecuteFailed(e.to_string()))
    }

    fn fetch_row(&mut self) -> Result<Option<Vec<NativeCell>>, SqlDbdError> {
        Ok(self.cursor.as_mut().and_then(VecDeque::pop_front))
    }

    fn free_cursor(&mut self) {
        self.cursor = None;
    }

    fn affected_rows(&self) -> Result<u64, SqlDbdError> {
        Ok(self.changes)
    }

    fn row_count(&self) -> Result<u64, SqlDbdError> {
        Err(SqlDbdError::not_implemented("duckdb", "rowcount"))
    }

    fn close(&mut self) {
        self.cursor = None;
        self.binds.clear();
    }
}
