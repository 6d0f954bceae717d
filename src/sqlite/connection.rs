use std::rc::Rc;

use rusqlite::Connection as RusqliteConnection;
use tracing::{debug, warn};

use super::config::SqliteOptions;
use super::statement::SqliteStatement;
use crate::adapter::{Capabilities, DriverConnection, DriverStatement};
use crate::error::SqlDbdError;
use crate::marshal::BindPolicy;
use crate::translation::PlaceholderStyle;

const CAPABILITIES: Capabilities = Capabilities {
    driver: "sqlite",
    placeholders: PlaceholderStyle::Positional,
    transactions: true,
    bind: BindPolicy {
        integer_binding: true,
    },
};

/// Native `SQLite` connection.
///
/// Statements keep a weak reference to the handle, so closing the connection releases
/// the database even while statements are still alive.
pub struct SqliteConnection {
    conn: Option<Rc<RusqliteConnection>>,
}

impl SqliteConnection {
    /// # Errors
    /// `SqlDbdError::ConnectionFailed` with `SQLite`'s diagnostic.
    pub fn open(opts: &SqliteOptions) -> Result<Self, SqlDbdError> {
        let conn = RusqliteConnection::open_with_flags(&opts.db_path, opts.open_flags())
            .map_err(|e| SqlDbdError::ConnectionFailed(format!("{}: {e}", opts.db_path)))?;
        debug!(db_path = %opts.db_path, create = opts.create, "opened sqlite database");
        Ok(Self {
            conn: Some(Rc::new(conn)),
        })
    }

    fn conn(&self) -> Result<&Rc<RusqliteConnection>, SqlDbdError> {
        self.conn.as_ref().ok_or(SqlDbdError::DbUnavailable)
    }

    fn batch(&self, sql: &str) -> Result<(), SqlDbdError> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|e| SqlDbdError::ExecuteFailed(e.to_string()))
    }
}

impl DriverConnection for SqliteConnection {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>, SqlDbdError> {
        let conn = self.conn()?;
        let stmt = SqliteStatement::prepare(conn, sql)?;
        Ok(Box::new(stmt))
    }

    fn begin(&mut self) -> Result<(), SqlDbdError> {
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), SqlDbdError> {
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SqlDbdError> {
        self.batch("ROLLBACK")
    }

    fn ping(&mut self) -> bool {
        self.batch("SELECT 1").is_ok()
    }

    fn quote(&self, text: &str) -> Result<String, SqlDbdError> {
        self.conn()?;
        Ok(text.replace('\'', "''"))
    }

    fn last_id(&self) -> Result<i64, SqlDbdError> {
        Ok(self.conn()?.last_insert_rowid())
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match Rc::try_unwrap(conn) {
            Ok(conn) => {
                if let Err((_, err)) = conn.close() {
                    warn!(error = %err, "sqlite close reported an error");
                }
            }
            // A statement is mid-call on the handle; it is released when that call returns.
            Err(_) => debug!("sqlite handle still borrowed at close"),
        }
    }
}
