// DuckDB adapter, backed by the duckdb crate (optional `duckdb` feature).
//
// DuckDB only describes result columns once a statement has run, so column metadata is
// unavailable between prepare and the first execute.

pub mod config;
pub mod connection;
pub mod statement;
pub mod types;

pub use config::{DuckDbOptions, DuckDbOptionsBuilder};
pub use connection::DuckDbConnection;
pub use statement::DuckDbStatement;
pub use types::DuckDbType;

use crate::connection::Connection;
use crate::error::SqlDbdError;

/// Open a `DuckDB` database and wrap it in a [`Connection`].
///
/// # Errors
/// `SqlDbdError::ConfigError` for invalid options, `SqlDbdError::ConnectionFailed` when
/// the database cannot be opened.
pub fn open(opts: &DuckDbOptions) -> Result<Connection, SqlDbdError> {
    opts.validate()?;
    let native = DuckDbConnection::open(opts)?;
    Ok(Connection::from_driver(Box::new(native), opts.autocommit))
}
