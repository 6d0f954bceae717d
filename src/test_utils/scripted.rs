use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::adapter::{
    Capabilities, ColumnDescriptor, DriverConnection, DriverStatement, ExecuteOutcome,
};
use crate::connection::Connection;
use crate::error::SqlDbdError;
use crate::marshal::{BindPolicy, NativeCell, NativeData, NativeTypeTag};
use crate::translation::PlaceholderStyle;
use crate::types::{DbValue, ValueKind};

/// One native call as seen by the scripted backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Prepare(String),
    Begin,
    Commit,
    Rollback,
    Ping,
    Bind { index: usize, value: DbValue },
    ClearBindings,
    Execute,
    FetchRow,
    FreeCursor,
    CloseStatement,
    CloseConnection,
}

/// Shared record of native calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<DriverCall>>>);

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.0.borrow_mut().push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.0.borrow().clone()
    }

    /// How many times `call` was recorded.
    #[must_use]
    pub fn count(&self, call: &DriverCall) -> usize {
        self.0.borrow().iter().filter(|c| *c == call).count()
    }

    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|c| matches!(c, DriverCall::Bind { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Column tag of the scripted backend: the kind itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScriptedType(ValueKind);

impl NativeTypeTag for ScriptedType {
    fn value_kind(self) -> ValueKind {
        self.0
    }

    fn type_name(self) -> &'static str {
        self.0.as_str()
    }
}

/// Script for an in-memory backend.
///
/// Every statement prepared on the resulting connection shares the same script: the
/// same parameter count, result columns and rows.
#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    placeholders: PlaceholderStyle,
    transactions: bool,
    integer_binding: bool,
    param_count: usize,
    columns: Vec<(String, ValueKind)>,
    describe_after_execute: bool,
    rows: Vec<Vec<NativeCell>>,
    affected: u64,
    fail_prepare: Option<String>,
    fail_bind_at: Option<usize>,
    fail_execute: Option<String>,
    fail_commit: Option<String>,
    log: CallLog,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self {
            placeholders: PlaceholderStyle::Positional,
            transactions: true,
            integer_binding: true,
            param_count: 0,
            columns: Vec::new(),
            describe_after_execute: false,
            rows: Vec::new(),
            affected: 0,
            fail_prepare: None,
            fail_bind_at: None,
            fail_execute: None,
            fail_commit: None,
            log: CallLog::default(),
        }
    }
}

impl ScriptedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn placeholders(mut self, style: PlaceholderStyle) -> Self {
        self.placeholders = style;
        self
    }

    #[must_use]
    pub fn without_transactions(mut self) -> Self {
        self.transactions = false;
        self
    }

    #[must_use]
    pub fn without_integer_binding(mut self) -> Self {
        self.integer_binding = false;
        self
    }

    #[must_use]
    pub fn params(mut self, count: usize) -> Self {
        self.param_count = count;
        self
    }

    /// Result columns; names are reported as given, before lower-casing.
    #[must_use]
    pub fn columns(mut self, columns: &[(&str, ValueKind)]) -> Self {
        self.columns = columns
            .iter()
            .map(|(name, kind)| ((*name).to_string(), *kind))
            .collect();
        self
    }

    /// Only describe result columns once a statement has executed.
    #[must_use]
    pub fn describe_after_execute(mut self) -> Self {
        self.describe_after_execute = true;
        self
    }

    /// Raw rows, returned by every execute.
    #[must_use]
    pub fn cells(mut self, rows: Vec<Vec<NativeCell>>) -> Self {
        self.rows = rows;
        self
    }

    /// Rows given as values; each cell is tagged with its value's own kind.
    #[must_use]
    pub fn rows(mut self, rows: Vec<Vec<DbValue>>) -> Self {
        self.rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(value_to_cell).collect())
            .collect();
        self
    }

    #[must_use]
    pub fn affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    #[must_use]
    pub fn fail_prepare(mut self, message: &str) -> Self {
        self.fail_prepare = Some(message.to_string());
        self
    }

    /// Reject the native bind of the 1-based parameter `index`.
    #[must_use]
    pub fn fail_bind_at(mut self, index: usize) -> Self {
        self.fail_bind_at = Some(index);
        self
    }

    #[must_use]
    pub fn fail_execute(mut self, message: &str) -> Self {
        self.fail_execute = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn fail_commit(mut self, message: &str) -> Self {
        self.fail_commit = Some(message.to_string());
        self
    }

    /// Handle on the call record, shared with the connection built from this script.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Open a [`Connection`] running this script.
    #[must_use]
    pub fn connect(self, autocommit: bool) -> Connection {
        Connection::from_driver(Box::new(ScriptedConnection { script: self }), autocommit)
    }
}

fn value_to_cell(value: DbValue) -> NativeCell {
    match value {
        DbValue::Nil => NativeCell::null(ValueKind::Nil),
        DbValue::Integer(i) => NativeCell::new(ValueKind::Integer, NativeData::Integer(i)),
        DbValue::Float(f) => NativeCell::new(ValueKind::Float, NativeData::Float(f)),
        DbValue::String(s) => NativeCell::new(ValueKind::String, NativeData::Text(s)),
        DbValue::Boolean(b) => NativeCell::new(ValueKind::Boolean, NativeData::Boolean(b)),
    }
}

struct ScriptedConnection {
    script: ScriptedDriver,
}

impl DriverConnection for ScriptedConnection {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            driver: "scripted",
            placeholders: self.script.placeholders,
            transactions: self.script.transactions,
            bind: BindPolicy {
                integer_binding: self.script.integer_binding,
            },
        }
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>, SqlDbdError> {
        self.script.log.push(DriverCall::Prepare(sql.to_string()));
        if let Some(message) = &self.script.fail_prepare {
            return Err(SqlDbdError::PrepareFailed(message.clone()));
        }
        Ok(Box::new(ScriptedStatement {
            script: self.script.clone(),
            executed: false,
            cursor: None,
        }))
    }

    fn begin(&mut self) -> Result<(), SqlDbdError> {
        self.script.log.push(DriverCall::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlDbdError> {
        self.script.log.push(DriverCall::Commit);
        match &self.script.fail_commit {
            Some(message) => Err(SqlDbdError::ExecuteFailed(message.clone())),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), SqlDbdError> {
        self.script.log.push(DriverCall::Rollback);
        Ok(())
    }

    fn ping(&mut self) -> bool {
        self.script.log.push(DriverCall::Ping);
        true
    }

    fn close(&mut self) {
        self.script.log.push(DriverCall::CloseConnection);
    }
}

struct ScriptedStatement {
    script: ScriptedDriver,
    executed: bool,
    cursor: Option<VecDeque<Vec<NativeCell>>>,
}

impl DriverStatement for ScriptedStatement {
    fn param_count(&self) -> usize {
        self.script.param_count
    }

    fn describe(&mut self) -> Result<Option<Vec<ColumnDescriptor>>, SqlDbdError> {
        if self.script.describe_after_execute && !self.executed {
            return Ok(None);
        }
        Ok(Some(
            self.script
                .columns
                .iter()
                .map(|(name, kind)| ColumnDescriptor::new(name, ScriptedType(*kind)))
                .collect(),
        ))
    }

    fn bind(&mut self, index: usize, value: &DbValue) -> Result<(), SqlDbdError> {
        self.script.log.push(DriverCall::Bind {
            index,
            value: value.clone(),
        });
        if self.script.fail_bind_at == Some(index) {
            return Err(SqlDbdError::BindingFailed(format!(
                "scripted bind failure at {index}"
            )));
        }
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.script.log.push(DriverCall::ClearBindings);
    }

    fn execute(&mut self) -> Result<ExecuteOutcome, SqlDbdError> {
        self.script.log.push(DriverCall::Execute);
        if let Some(message) = &self.script.fail_execute {
            return Err(SqlDbdError::ExecuteFailed(message.clone()));
        }
        self.executed = true;
        if self.script.columns.is_empty() {
            return Ok(ExecuteOutcome { has_rows: false });
        }
        self.cursor = Some(self.script.rows.iter().cloned().collect());
        Ok(ExecuteOutcome { has_rows: true })
    }

    fn fetch_row(&mut self) -> Result<Option<Vec<NativeCell>>, SqlDbdError> {
        self.script.log.push(DriverCall::FetchRow);
        Ok(self.cursor.as_mut().and_then(VecDeque::pop_front))
    }

    fn free_cursor(&mut self) {
        if self.cursor.take().is_some() {
            self.script.log.push(DriverCall::FreeCursor);
        }
    }

    fn affected_rows(&self) -> Result<u64, SqlDbdError> {
        Ok(self.script.affected)
    }

    fn row_count(&self) -> Result<u64, SqlDbdError> {
        Err(SqlDbdError::not_implemented("scripted", "rowcount"))
    }

    fn close(&mut self) {
        self.script.log.push(DriverCall::CloseStatement);
    }
}
