use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};

use crate::config::default_true;
use crate::connection::Connection;
use crate::error::SqlDbdError;

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    /// File path, `:memory:`, or a `file:` URI.
    pub db_path: String,
    /// Create the database file if it does not exist yet.
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_true")]
    pub autocommit: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            create: false,
            read_only: false,
            autocommit: true,
        }
    }

    /// # Errors
    /// `SqlDbdError::ConfigError` when the path is empty or `create` is combined with
    /// `read_only`.
    pub fn validate(&self) -> Result<(), SqlDbdError> {
        if self.db_path.is_empty() {
            return Err(SqlDbdError::ConfigError("db_path is required".to_string()));
        }
        if self.create && self.read_only {
            return Err(SqlDbdError::ConfigError(
                "create and read_only are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let mode = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.opts.create = create;
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.opts.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a connection with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlDbdError` if the options are invalid or the database cannot be opened.
    pub fn build(self) -> Result<Connection, SqlDbdError> {
        super::open(&self.finish())
    }
}
