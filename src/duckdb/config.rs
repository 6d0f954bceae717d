use duckdb::{AccessMode, Config};
use serde::{Deserialize, Serialize};

use crate::config::default_true;
use crate::connection::Connection;
use crate::error::SqlDbdError;

/// Options for opening a `DuckDB` database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckDbOptions {
    /// File path, or `:memory:` for a private in-memory database.
    pub db_path: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_true")]
    pub autocommit: bool,
}

impl DuckDbOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            read_only: false,
            autocommit: true,
        }
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }

    /// # Errors
    /// `SqlDbdError::ConfigError` when the path is empty or an in-memory database is
    /// opened read-only.
    pub fn validate(&self) -> Result<(), SqlDbdError> {
        if self.db_path.is_empty() {
            return Err(SqlDbdError::ConfigError("db_path is required".to_string()));
        }
        if self.read_only && self.is_in_memory() {
            return Err(SqlDbdError::ConfigError(
                "an in-memory database cannot be read_only".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn duckdb_config(&self) -> Result<Config, SqlDbdError> {
        if self.read_only {
            Config::default()
                .access_mode(AccessMode::ReadOnly)
                .map_err(|e| SqlDbdError::ConfigError(e.to_string()))
        } else {
            Ok(Config::default())
        }
    }
}

/// Fluent builder for `DuckDB` options.
#[derive(Debug, Clone)]
pub struct DuckDbOptionsBuilder {
    opts: DuckDbOptions,
}

impl DuckDbOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DuckDbOptions::new(db_path),
        }
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
    pub fn finish(self) -> DuckDbOptions {
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
