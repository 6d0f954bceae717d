//! Connection options for every compiled-in backend.
//!
//! Each backend has its own options struct and builder next to its adapter; this module
//! ties them together into one [`ConnectOptions`] value that can be built in code or
//! loaded from a JSON document tagged by driver name:
//!
//! ```rust
//! # #[cfg(feature = "sqlite")] {
//! use sql_dbd::prelude::*;
//!
//! let options = ConnectOptions::from_json(
//!     r#"{"driver": "sqlite", "db_path": "scores.db", "create": true}"#,
//! )
//! .unwrap();
//! assert_eq!(options.database_type(), DatabaseType::Sqlite);
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SqlDbdError;
use crate::types::DatabaseType;

#[cfg(feature = "duckdb")]
use crate::duckdb::DuckDbOptions;
#[cfg(feature = "postgres")]
use crate::postgres::PostgresOptions;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteOptions;

/// Options for opening a connection, keyed by driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum ConnectOptions {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "postgres")]
    Postgres(PostgresOptions),
    #[cfg(feature = "duckdb")]
    Duckdb(DuckDbOptions),
}

impl ConnectOptions {
    /// Parse and validate options from JSON.
    ///
    /// # Errors
    /// `SqlDbdError::ConfigError` for malformed JSON, an unknown driver, or options that
    /// fail validation.
    pub fn from_json(json: &str) -> Result<Self, SqlDbdError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| SqlDbdError::ConfigError(format!("invalid connection options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every required field is present.
    ///
    /// # Errors
    /// `SqlDbdError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), SqlDbdError> {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(opts) => opts.validate(),
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(opts) => opts.validate(),
            #[cfg(feature = "duckdb")]
            ConnectOptions::Duckdb(opts) => opts.validate(),
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "duckdb")]
            ConnectOptions::Duckdb(_) => DatabaseType::Duckdb,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteOptions> for ConnectOptions {
    fn from(opts: SqliteOptions) -> Self {
        ConnectOptions::Sqlite(opts)
    }
}

#[cfg(feature = "postgres")]
impl From<PostgresOptions> for ConnectOptions {
    fn from(opts: PostgresOptions) -> Self {
        ConnectOptions::Postgres(opts)
    }
}

#[cfg(feature = "duckdb")]
impl From<DuckDbOptions> for ConnectOptions {
    fn from(opts: DuckDbOptions) -> Self {
        ConnectOptions::Duckdb(opts)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn unknown_driver_is_a_config_error() {
        let err = ConnectOptions::from_json(r#"{"driver": "oracle"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ConnectOptions::from_json("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_options_default_to_autocommit() {
        let opts = ConnectOptions::from_json(r#"{"driver": "sqlite", "db_path": ":memory:"}"#)
            .unwrap();
        let ConnectOptions::Sqlite(sqlite) = &opts else {
            panic!("expected sqlite options, got {opts:?}");
        };
        assert!(sqlite.autocommit);
        assert!(!sqlite.create);
        assert_eq!(opts.database_type().driver_name(), "sqlite");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn empty_sqlite_path_is_rejected() {
        let err = ConnectOptions::from_json(r#"{"driver": "sqlite", "db_path": ""}"#)
            .unwrap_err();
        assert!(err.to_string().contains("db_path"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_requires_dbname() {
        let err = ConnectOptions::from_json(
            r#"{"driver": "postgres", "host": "localhost", "user": "app"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("dbname"));

        let opts = ConnectOptions::from_json(
            r#"{"driver": "postgres", "host": "localhost", "user": "app", "dbname": "scores"}"#,
        )
        .unwrap();
        let ConnectOptions::Postgres(pg) = opts else {
            panic!("expected postgres options");
        };
        assert_eq!(pg.port, 5432);
        assert!(pg.password.is_none());
    }
}
