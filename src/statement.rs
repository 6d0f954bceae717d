use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use tracing::debug;

use crate::adapter::{Capabilities, ColumnDescriptor, DriverStatement};
use crate::connection::Session;
use crate::error::SqlDbdError;
use crate::marshal::{BindPolicy, decode_cell, encode_params};
use crate::results::{ColumnIndex, NamedRow, Row, Rows};
use crate::types::{DbValue, ScriptValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Prepared, and not successfully executed since the last attempt.
    Prepared,
    /// Executed without producing a cursor.
    Ready,
    HasCursor,
    /// The cursor ran dry and was released.
    Exhausted,
}

/// A prepared statement bound to one [`Connection`](crate::Connection).
///
/// The statement moves through prepare, execute and fetch in that order; every execute
/// discards the previous cursor and starts over. Closing (explicitly or on drop) releases
/// the native handle exactly once.
///
/// ```rust,no_run
/// use sql_dbd::prelude::*;
///
/// # fn main() -> Result<(), SqlDbdError> {
/// let options = SqliteOptionsBuilder::new(":memory:").create(true).finish();
/// let conn = Connection::connect(&options.into())?;
/// let mut stmt = conn.prepare("select ? + 1 as answer")?;
/// stmt.execute(&[41.into()])?;
/// let row = stmt.fetch(true)?.expect("one row");
/// assert_eq!(row.get("answer"), Some(&DbValue::Integer(42)));
/// assert!(stmt.fetch(true)?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct Statement {
    session: Weak<RefCell<Session>>,
    handle: Option<Box<dyn DriverStatement>>,
    sql: String,
    driver: &'static str,
    bind_policy: BindPolicy,
    param_count: usize,
    /// Populated at most once; `Some(vec![])` means the statement has no result columns.
    columns: Option<Vec<ColumnDescriptor>>,
    column_index: Option<ColumnIndex>,
    phase: Phase,
}

impl Statement {
    pub(crate) fn new(
        session: Weak<RefCell<Session>>,
        mut handle: Box<dyn DriverStatement>,
        sql: String,
        capabilities: Capabilities,
    ) -> Result<Self, SqlDbdError> {
        let columns = match handle.describe() {
            Ok(columns) => columns,
            Err(err) => {
                handle.close();
                return Err(SqlDbdError::PrepareFailed(err.to_string()));
            }
        };
        let param_count = handle.param_count();
        debug!(
            driver = capabilities.driver,
            params = param_count,
            sql = %sql,
            "prepared statement"
        );
        Ok(Self {
            session,
            handle: Some(handle),
            sql,
            driver: capabilities.driver,
            bind_policy: capabilities.bind,
            param_count,
            columns,
            column_index: None,
            phase: Phase::Prepared,
        })
    }

    /// The SQL text sent to the backend, after placeholder translation.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of parameters every `execute` must supply.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Execute the statement with `params` bound in order.
    ///
    /// Any open cursor from a previous execute is discarded first; if this execute then
    /// fails, fetching reports `FetchBeforeExecute` until a later one succeeds. The
    /// argument count and every argument's type are checked before the backend sees a
    /// single bind, so a rejected call leaves no native side effects. When the connection
    /// has autocommit off and no transaction is open yet, one is started before binding.
    ///
    /// # Errors
    /// * `SqlDbdError::InvalidStatement` if the statement is closed
    /// * `SqlDbdError::DbUnavailable` if the owning connection is closed
    /// * `SqlDbdError::ParamCountMismatch` when `params.len()` differs from
    ///   [`param_count`](Self::param_count)
    /// * `SqlDbdError::BindingTypeUnsupported` for a value with no SQL representation
    /// * `SqlDbdError::BindingFailed` / `SqlDbdError::ExecuteFailed` from the backend
    pub fn execute(&mut self, params: &[ScriptValue]) -> Result<(), SqlDbdError> {
        if self.handle.is_none() {
            return Err(SqlDbdError::InvalidStatement);
        }
        let session = self.session.upgrade().ok_or(SqlDbdError::DbUnavailable)?;
        if session.borrow().is_closed() {
            return Err(SqlDbdError::DbUnavailable);
        }

        let handle = self.handle.as_mut().ok_or(SqlDbdError::InvalidStatement)?;
        handle.free_cursor();
        // Until this execute succeeds there is no result to fetch from.
        self.phase = Phase::Prepared;

        if params.len() != self.param_count {
            return Err(SqlDbdError::ParamCountMismatch {
                expected: self.param_count,
                received: params.len(),
            });
        }
        let values = encode_params(params, self.bind_policy)?;

        session.borrow_mut().begin_if_needed()?;
        drop(session);

        for (idx, value) in values.iter().enumerate() {
            if let Err(err) = handle.bind(idx + 1, value) {
                handle.clear_bindings();
                return Err(match err {
                    SqlDbdError::BindingFailed(_) => err,
                    other => SqlDbdError::BindingFailed(other.to_string()),
                });
            }
        }

        debug!(driver = self.driver, params = values.len(), "executing statement");
        let outcome = handle.execute()?;

        if self.columns.is_none() {
            self.columns = Some(handle.describe()?.unwrap_or_default());
        }
        self.phase = if outcome.has_rows {
            Phase::HasCursor
        } else {
            Phase::Ready
        };
        Ok(())
    }

    /// Fetch the next row of the current result.
    ///
    /// Returns `Ok(None)` once the result is exhausted (the cursor is released at that
    /// point) and keeps returning it until the next [`execute`](Self::execute).
    ///
    /// # Errors
    /// * `SqlDbdError::InvalidStatement` if the statement is closed
    /// * `SqlDbdError::FetchBeforeExecute` if the last execute failed or none was issued
    /// * `SqlDbdError::DbUnavailable` if the owning connection closed under an open cursor
    /// * `SqlDbdError::FetchFailed` / `SqlDbdError::UnknownResultKind` while reading the row
    pub fn fetch(&mut self, named: bool) -> Result<Option<Row>, SqlDbdError> {
        let session_open = self
            .session
            .upgrade()
            .is_some_and(|session| !session.borrow().is_closed());
        let handle = self.handle.as_mut().ok_or(SqlDbdError::InvalidStatement)?;
        match self.phase {
            Phase::Prepared => return Err(SqlDbdError::FetchBeforeExecute),
            Phase::Ready | Phase::Exhausted => return Ok(None),
            Phase::HasCursor if !session_open => {
                handle.free_cursor();
                return Err(SqlDbdError::DbUnavailable);
            }
            Phase::HasCursor => {}
        }

        let Some(cells) = handle.fetch_row()? else {
            handle.free_cursor();
            self.phase = Phase::Exhausted;
            return Ok(None);
        };

        let values = cells
            .into_iter()
            .map(decode_cell)
            .collect::<Result<Vec<DbValue>, _>>()?;

        if !named {
            return Ok(Some(Row::Positional(values)));
        }
        let index = self.column_index()?;
        Ok(Some(Row::Named(NamedRow::new(
            index.names.clone(),
            index.lookup.clone(),
            values,
        ))))
    }

    /// Iterate the remaining rows of the current result.
    pub fn rows(&mut self, named: bool) -> Rows<'_> {
        Rows::new(self, named)
    }

    /// Lower-cased result column names in order, or `None` when the statement produces
    /// no columns.
    ///
    /// # Errors
    /// * `SqlDbdError::InvalidStatement` if the statement is closed
    /// * `SqlDbdError::FetchBeforeExecute` when the backend only describes results after
    ///   execution and the statement has not run yet
    pub fn columns(&self) -> Result<Option<Vec<String>>, SqlDbdError> {
        if self.handle.is_none() {
            return Err(SqlDbdError::InvalidStatement);
        }
        match &self.columns {
            None => Err(SqlDbdError::FetchBeforeExecute),
            Some(columns) if columns.is_empty() => Ok(None),
            Some(columns) => Ok(Some(columns.iter().map(|c| c.name.clone()).collect())),
        }
    }

    /// Column metadata, when known.
    #[must_use]
    pub fn column_descriptors(&self) -> Option<&[ColumnDescriptor]> {
        self.columns.as_deref()
    }

    /// Rows changed by the last execute.
    ///
    /// # Errors
    /// `SqlDbdError::InvalidStatement` on a closed statement, or `NotImplemented` from
    /// backends that cannot report it.
    pub fn affected_rows(&self) -> Result<u64, SqlDbdError> {
        self.handle
            .as_ref()
            .ok_or(SqlDbdError::InvalidStatement)?
            .affected_rows()
    }

    /// Rows in the current result.
    ///
    /// # Errors
    /// `SqlDbdError::InvalidStatement` on a closed statement, or `NotImplemented` from
    /// backends that stream results without counting them.
    pub fn rowcount(&self) -> Result<u64, SqlDbdError> {
        self.handle
            .as_ref()
            .ok_or(SqlDbdError::InvalidStatement)?
            .row_count()
    }

    /// Release the cursor and the native handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.free_cursor();
            handle.close();
            debug!(driver = self.driver, "closed statement");
        }
        self.columns = None;
        self.column_index = None;
    }

    fn column_index(&mut self) -> Result<&ColumnIndex, SqlDbdError> {
        if self.column_index.is_none() {
            let columns = self
                .columns
                .as_deref()
                .ok_or(SqlDbdError::FetchBeforeExecute)?;
            self.column_index = Some(ColumnIndex::from_descriptors(columns));
        }
        self.column_index
            .as_ref()
            .ok_or(SqlDbdError::FetchBeforeExecute)
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_closed() { "closed" } else { "open" };
        write!(f, "{} statement: {state}", self.driver)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("driver", &self.driver)
            .field("sql", &self.sql)
            .field("param_count", &self.param_count)
            .field("phase", &self.phase)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
