use std::rc::Rc;

use duckdb::Connection as DuckConnection;
use tracing::{debug, warn};

use super::config::DuckDbOptions;
use super::statement::DuckDbStatement;
use crate::adapter::{Capabilities, DriverConnection, DriverStatement};
use crate::error::SqlDbdError;
use crate::marshal::BindPolicy;
use crate::translation::PlaceholderStyle;

const CAPABILITIES: Capabilities = Capabilities {
    driver: "duckdb",
    placeholders: PlaceholderStyle::Positional,
    transactions: true,
    bind: BindPolicy {
        integer_binding: true,
    },
};

/// Native `DuckDB` connection. `quote` and `last_id` are not available.
pub struct DuckDbConnection {
    conn: Option<Rc<DuckConnection>>,
}

impl DuckDbConnection {
    /// # Errors
    /// `SqlDbdError::ConnectionFailed` with `DuckDB`'s diagnostic.
    pub fn open(opts: &DuckDbOptions) -> Result<Self, SqlDbdError> {
        let conn = if opts.is_in_memory() {
            DuckConnection::open_in_memory()
        } else {
            DuckConnection::open_with_flags(&opts.db_path, opts.duckdb_config()?)
        }
        .map_err(|e| SqlDbdError::ConnectionFailed(format!("{}: {e}", opts.db_path)))?;
        debug!(db_path = %opts.db_path, read_only = opts.read_only, "opened duckdb database");
        Ok(Self {
            conn: Some(Rc::new(conn)),
        })
    }

    fn conn(&self) -> Result<&Rc<DuckConnection>, SqlDbdError> {
        self.conn.as_ref().ok_or(SqlDbdError::DbUnavailable)
    }

    fn batch(&self, sql: &str) -> Result<(), SqlDbdError> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|e| SqlDbdError::ExecuteFailed(e.to_string()))
    }
}

impl DriverConnection for DuckDbConnection {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>, SqlDbdError> {
        let conn = self.conn()?;
        Ok(Box::new(DuckDbStatement::prepare(conn, sql)?))
    }

    fn begin(&mut self) -> Result<(), SqlDbdError> {
        self.batch("BEGIN TRANSACTION")
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

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Ok(conn) = Rc::try_unwrap(conn) {
            if let Err((_, err)) = conn.close() {
                warn!(error = %err, "duckdb close reported an error");
            }
        }
    }
}
