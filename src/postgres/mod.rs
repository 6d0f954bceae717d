// PostgreSQL adapter, backed by tokio-postgres on a private current-thread runtime.
//
// - config: connection options and builder
// - types: type tags, parameter encoding and column decoding
// - connection: the client plus the runtime driving it
// - statement: server-side prepared statements with buffered results

pub mod config;
pub mod connection;
pub mod statement;
pub mod types;

pub use config::{PostgresOptions, PostgresOptionsBuilder};
pub use connection::PostgresConnection;
pub use statement::PostgresStatement;
pub use types::PgType;

use crate::connection::Connection;
use crate::error::SqlDbdError;

/// Connect to a `PostgreSQL` server and wrap the session in a [`Connection`].
///
/// # Errors
/// `SqlDbdError::ConfigError` when required options are missing,
/// `SqlDbdError::ConnectionFailed` when the server cannot be reached or rejects the login.
pub fn open(opts: &PostgresOptions) -> Result<Connection, SqlDbdError> {
    opts.validate()?;
    let native = PostgresConnection::open(opts)?;
    Ok(Connection::from_driver(Box::new(native), opts.autocommit))
}

/// Best diagnostic text for a `tokio_postgres` error: the server message when there is one.
pub(crate) fn pg_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{}: {} ({detail})", db.severity(), db.message()),
            None => format!("{}: {}", db.severity(), db.message()),
        },
        None => err.to_string(),
    }
}
