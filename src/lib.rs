//! Blocking, driver-independent statement and connection layer.
//!
//! Every backend implements the small native-call boundary in [`adapter`]; the shared
//! [`Connection`] and [`Statement`] state machines drive it with the same rules
//! everywhere: portable `?` placeholders, argument checks before any native bind,
//! NULL-first value decoding, an explicit end-of-rows sentinel, and implicit
//! transactions when autocommit is off.
//!
//! ```rust,no_run
//! use sql_dbd::prelude::*;
//!
//! # fn main() -> Result<(), SqlDbdError> {
//! let mut conn = SqliteOptionsBuilder::new("scores.db").create(true).build()?;
//! conn.run("create table if not exists scores (id integer, name text)", &[])?;
//!
//! conn.autocommit(false)?;
//! let mut insert = conn.prepare("insert into scores values (?, ?)")?;
//! insert.execute(&[1.into(), "alice".into()])?;
//! insert.execute(&[2.into(), ScriptValue::Nil])?;
//! conn.commit()?;
//!
//! let mut select = conn.prepare("select id, name from scores order by id")?;
//! select.execute(&[])?;
//! for row in select.rows(true) {
//!     let row = row?;
//!     println!("{:?} {:?}", row.get("id"), row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod connection;
pub mod error;
pub mod marshal;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "duckdb")]
pub mod duckdb;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::ConnectOptions;
pub use connection::Connection;
pub use error::{ErrorKind, SqlDbdError};
pub use results::{NamedRow, Row, Rows};
pub use statement::Statement;
pub use types::{DatabaseType, DbValue, ScriptValue, ValueKind};
