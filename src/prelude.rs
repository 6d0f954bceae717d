//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::adapter::{ColumnDescriptor, DriverConnection, DriverStatement};
pub use crate::config::ConnectOptions;
pub use crate::connection::Connection;
pub use crate::error::{ErrorKind, SqlDbdError};
pub use crate::results::{NamedRow, Row, Rows};
pub use crate::statement::Statement;
pub use crate::translation::{PlaceholderStyle, translate_placeholders};
pub use crate::types::{DatabaseType, DbValue, ScriptValue, ValueKind};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteOptions, SqliteOptionsBuilder};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresOptions, PostgresOptionsBuilder};

#[cfg(feature = "duckdb")]
pub use crate::duckdb::{DuckDbOptions, DuckDbOptionsBuilder};
