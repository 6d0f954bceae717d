use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::default_true;
use crate::connection::Connection;
use crate::error::SqlDbdError;

fn default_port() -> u16 {
    5432
}

/// Options for connecting to `PostgreSQL`.
///
/// Either `url` (a libpq-style connection string or `postgresql://` URL) or the
/// `host`/`dbname`/`user` triple must be given. Explicit fields override the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub autocommit: bool,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: default_port(),
            dbname: None,
            user: None,
            password: None,
            autocommit: true,
        }
    }
}

impl PostgresOptions {
    /// Options taken entirely from a connection string.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// # Errors
    /// `SqlDbdError::ConfigError` naming the first missing field, or describing an
    /// unparsable `url`.
    pub fn validate(&self) -> Result<(), SqlDbdError> {
        if let Some(url) = &self.url {
            tokio_postgres::Config::from_str(url)
                .map_err(|e| SqlDbdError::ConfigError(format!("invalid url: {e}")))?;
            return Ok(());
        }
        if self.dbname.is_none() {
            return Err(SqlDbdError::ConfigError("dbname is required".to_string()));
        }
        if self.host.is_none() {
            return Err(SqlDbdError::ConfigError("host is required".to_string()));
        }
        if self.user.is_none() {
            return Err(SqlDbdError::ConfigError("user is required".to_string()));
        }
        Ok(())
    }

    /// Build the native client configuration.
    ///
    /// # Errors
    /// `SqlDbdError::ConfigError` for an unparsable `url`.
    pub fn pg_config(&self) -> Result<tokio_postgres::Config, SqlDbdError> {
        let mut config = match &self.url {
            Some(url) => tokio_postgres::Config::from_str(url)
                .map_err(|e| SqlDbdError::ConfigError(format!("invalid url: {e}")))?,
            None => {
                let mut config = tokio_postgres::Config::new();
                config.port(self.port);
                config
            }
        };
        if let Some(host) = &self.host {
            config.host(host);
        }
        if let Some(dbname) = &self.dbname {
            config.dbname(dbname);
        }
        if let Some(user) = &self.user {
            config.user(user);
        }
        if let Some(password) = &self.password {
            config.password(password);
        }
        Ok(config)
    }
}

/// Fluent builder for `PostgreSQL` options.
#[derive(Debug, Clone, Default)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.opts.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.opts.dbname = Some(dbname.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.opts.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.opts.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }

    /// Connect with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlDbdError` if the options are incomplete or the connection fails.
    pub fn build(self) -> Result<Connection, SqlDbdError> {
        super::open(&self.finish())
    }
}
