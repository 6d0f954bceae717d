// SQLite adapter, backed by rusqlite.
//
// - config: open options and builder
// - types: storage-class tags and value conversion
// - connection: the native connection handle
// - statement: prepared statements with buffered cursors

pub mod config;
pub mod connection;
pub mod statement;
pub mod types;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use statement::SqliteStatement;
pub use types::SqliteType;

use crate::connection::Connection;
use crate::error::SqlDbdError;

/// Open a `SQLite` database and wrap it in a [`Connection`].
///
/// # Errors
/// `SqlDbdError::ConfigError` for invalid options, `SqlDbdError::ConnectionFailed` when
/// `SQLite` cannot open the file.
pub fn open(opts: &SqliteOptions) -> Result<Connection, SqlDbdError> {
    opts.validate()?;
    let native = SqliteConnection::open(opts)?;
    Ok(Connection::from_driver(Box::new(native), opts.autocommit))
}
