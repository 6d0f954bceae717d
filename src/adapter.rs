//! The native-call boundary every backend implements.
//!
//! [`DriverConnection`] and [`DriverStatement`] are the only things an engine has to
//! provide; the shared [`Connection`](crate::Connection) and
//! [`Statement`](crate::Statement) state machines drive them in the same order for every
//! backend. Adapters translate native failures into [`SqlDbdError`] values carrying the
//! driver's diagnostic text before returning.

use crate::error::SqlDbdError;
use crate::marshal::{BindPolicy, NativeCell, NativeTypeTag};
use crate::translation::PlaceholderStyle;
use crate::types::{DbValue, ValueKind};

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Display name, lower-cased.
    pub name: String,
    /// Backend spelling of the column's type tag.
    pub native_type: &'static str,
    /// Kind values of this column decode to.
    pub kind: ValueKind,
    /// Client-side buffer size the backend needs for this column, if fixed.
    pub max_size: Option<usize>,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new<T: NativeTypeTag>(name: &str, tag: T) -> Self {
        Self {
            name: name.to_lowercase(),
            native_type: tag.type_name(),
            kind: tag.value_kind(),
            max_size: tag.buffer_size(),
        }
    }
}

/// What a successful native execute produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// A cursor is open and rows can be fetched.
    pub has_rows: bool,
}

/// Static facts about a backend that the shared layer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Registration name, used in messages and `Display`.
    pub driver: &'static str,
    pub placeholders: PlaceholderStyle,
    /// The backend has native begin/commit/rollback.
    pub transactions: bool,
    pub bind: BindPolicy,
}

/// Native connection handle of one backend.
pub trait DriverConnection {
    fn capabilities(&self) -> Capabilities;

    /// Prepare `sql`, which already uses the backend's native placeholder syntax.
    ///
    /// # Errors
    /// `SqlDbdError::PrepareFailed` with the backend diagnostic, or
    /// `SqlDbdError::DbUnavailable` when the handle is gone.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>, SqlDbdError>;

    /// # Errors
    /// `SqlDbdError::ExecuteFailed` with the backend diagnostic.
    fn begin(&mut self) -> Result<(), SqlDbdError>;

    /// # Errors
    /// `SqlDbdError::ExecuteFailed` with the backend diagnostic.
    fn commit(&mut self) -> Result<(), SqlDbdError>;

    /// # Errors
    /// `SqlDbdError::ExecuteFailed` with the backend diagnostic.
    fn rollback(&mut self) -> Result<(), SqlDbdError>;

    fn ping(&mut self) -> bool;

    /// Escape `text` for inclusion in a single-quoted literal.
    ///
    /// # Errors
    /// `SqlDbdError::NotImplemented` unless the backend has an escaping helper.
    fn quote(&self, text: &str) -> Result<String, SqlDbdError> {
        let _ = text;
        Err(SqlDbdError::not_implemented(
            self.capabilities().driver,
            "quote",
        ))
    }

    /// # Errors
    /// `SqlDbdError::NotImplemented` unless the backend tracks inserted row ids.
    fn last_id(&self) -> Result<i64, SqlDbdError> {
        Err(SqlDbdError::not_implemented(
            self.capabilities().driver,
            "last_id",
        ))
    }

    /// Release the native handle. Called at most once.
    fn close(&mut self);
}

/// Native prepared-statement handle of one backend.
pub trait DriverStatement {
    /// Number of parameters the prepared SQL expects.
    fn param_count(&self) -> usize;

    /// Column metadata, if the backend knows it yet.
    ///
    /// Backends that describe at prepare time return `Some` right away; the others return
    /// `None` until after the first successful execute.
    ///
    /// # Errors
    /// `SqlDbdError::FetchFailed` when the describe call itself fails.
    fn describe(&mut self) -> Result<Option<Vec<ColumnDescriptor>>, SqlDbdError>;

    /// Bind `value` to the 1-based parameter `index`.
    ///
    /// # Errors
    /// `SqlDbdError::BindingFailed` with the backend diagnostic.
    fn bind(&mut self, index: usize, value: &DbValue) -> Result<(), SqlDbdError>;

    /// Drop any values bound so far, after a failed bind.
    fn clear_bindings(&mut self);

    /// # Errors
    /// `SqlDbdError::ExecuteFailed` with the backend diagnostic, or
    /// `SqlDbdError::DbUnavailable` when the owning connection is gone.
    fn execute(&mut self) -> Result<ExecuteOutcome, SqlDbdError>;

    /// Next row of the open cursor, or `None` once exhausted.
    ///
    /// # Errors
    /// `SqlDbdError::FetchFailed` with the backend diagnostic.
    fn fetch_row(&mut self) -> Result<Option<Vec<NativeCell>>, SqlDbdError>;

    /// Discard the open cursor. A no-op when there is none.
    fn free_cursor(&mut self);

    /// # Errors
    /// `SqlDbdError::NotImplemented` when the backend cannot report changed rows.
    fn affected_rows(&self) -> Result<u64, SqlDbdError>;

    /// # Errors
    /// `SqlDbdError::NotImplemented` when the backend cannot count result rows.
    fn row_count(&self) -> Result<u64, SqlDbdError>;

    /// Release the native handle. Called at most once.
    fn close(&mut self);
}
