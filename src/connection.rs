use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::adapter::{Capabilities, DriverConnection};
use crate::config::ConnectOptions;
use crate::error::SqlDbdError;
use crate::statement::Statement;
use crate::translation::translate_placeholders;
use crate::types::ScriptValue;

/// Connection state shared with the statements prepared on it.
///
/// Statements only hold a weak reference, so a dropped [`Connection`] makes every
/// statement report `DbUnavailable` instead of touching a released handle.
pub(crate) struct Session {
    driver: Option<Box<dyn DriverConnection>>,
    capabilities: Capabilities,
    autocommit: bool,
    in_transaction: bool,
}

impl Session {
    pub(crate) fn is_closed(&self) -> bool {
        self.driver.is_none()
    }

    /// Start a native transaction when autocommit is off and none is open yet.
    pub(crate) fn begin_if_needed(&mut self) -> Result<(), SqlDbdError> {
        let driver = self.driver.as_mut().ok_or(SqlDbdError::DbUnavailable)?;
        if self.autocommit || self.in_transaction || !self.capabilities.transactions {
            return Ok(());
        }
        driver.begin()?;
        self.in_transaction = true;
        debug!(driver = self.capabilities.driver, "began transaction");
        Ok(())
    }
}

/// An open database connection.
///
/// One connection is used from one thread at a time. Transactions are implicit: with
/// autocommit off the first execute opens one, and [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) ends it.
pub struct Connection {
    session: Rc<RefCell<Session>>,
    driver: &'static str,
}

impl Connection {
    /// Open a connection with the adapter registered for `options`' driver.
    ///
    /// # Errors
    /// `SqlDbdError::ConnectionFailed` with the backend diagnostic, or
    /// `SqlDbdError::ConfigError` when the options are inconsistent.
    pub fn connect(options: &ConnectOptions) -> Result<Self, SqlDbdError> {
        match options {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(opts) => crate::sqlite::open(opts),
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(opts) => crate::postgres::open(opts),
            #[cfg(feature = "duckdb")]
            ConnectOptions::Duckdb(opts) => crate::duckdb::open(opts),
        }
    }

    /// Wrap an opened native connection.
    ///
    /// Adapters call this once their handle is live; it is public so out-of-tree adapters
    /// can reuse the shared state machines.
    #[must_use]
    pub fn from_driver(driver: Box<dyn DriverConnection>, autocommit: bool) -> Self {
        let capabilities = driver.capabilities();
        debug!(
            driver = capabilities.driver,
            autocommit, "opened connection"
        );
        Self {
            session: Rc::new(RefCell::new(Session {
                driver: Some(driver),
                capabilities,
                autocommit,
                in_transaction: false,
            })),
            driver: capabilities.driver,
        }
    }

    /// Registration name of the backend behind this connection.
    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        self.driver
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session.borrow().is_closed()
    }

    #[must_use]
    pub fn is_autocommit(&self) -> bool {
        self.session.borrow().autocommit
    }

    /// A native transaction is currently open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.session.borrow().in_transaction
    }

    /// Prepare `sql`, rewriting portable `?` placeholders into the backend's syntax.
    ///
    /// # Errors
    /// * `SqlDbdError::DbUnavailable` if the connection is closed
    /// * `SqlDbdError::PrepareFailed` with the backend diagnostic
    pub fn prepare(&self, sql: &str) -> Result<Statement, SqlDbdError> {
        let mut session = self.session.borrow_mut();
        let capabilities = session.capabilities;
        let driver = session.driver.as_mut().ok_or(SqlDbdError::DbUnavailable)?;

        let translated = translate_placeholders(sql, capabilities.placeholders)?;
        let handle = driver.prepare(&translated)?;
        let translated = translated.into_owned();
        drop(session);

        Statement::new(Rc::downgrade(&self.session), handle, translated, capabilities)
    }

    /// Prepare, execute once with `params` and return the number of affected rows.
    ///
    /// # Errors
    /// Any error from [`prepare`](Self::prepare) or [`Statement::execute`].
    pub fn run(&self, sql: &str, params: &[ScriptValue]) -> Result<u64, SqlDbdError> {
        let mut stmt = self.prepare(sql)?;
        stmt.execute(params)?;
        let affected = stmt.affected_rows();
        stmt.close();
        affected
    }

    /// Switch autocommit mode.
    ///
    /// Turning autocommit on while a transaction is open commits it first; it is never
    /// rolled back. Setting the current mode again does nothing.
    ///
    /// # Errors
    /// `SqlDbdError::DbUnavailable` on a closed connection, or the backend's commit
    /// failure.
    pub fn autocommit(&mut self, on: bool) -> Result<(), SqlDbdError> {
        let mut session = self.session.borrow_mut();
        let Session {
            driver,
            autocommit,
            in_transaction,
            ..
        } = &mut *session;
        let driver = driver.as_mut().ok_or(SqlDbdError::DbUnavailable)?;

        if *autocommit == on {
            return Ok(());
        }
        if on && *in_transaction {
            driver.commit()?;
            *in_transaction = false;
            debug!(driver = self.driver, "committed transaction on autocommit");
        }
        *autocommit = on;
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// Returns `false` when the connection is closed or the backend has no transactions,
    /// and `true` without a native call when no transaction is open.
    ///
    /// # Errors
    /// The backend's commit failure; the transaction stays open in that case.
    pub fn commit(&mut self) -> Result<bool, SqlDbdError> {
        self.end_transaction(true)
    }

    /// Roll back the open transaction.
    ///
    /// Same return convention as [`commit`](Self::commit).
    ///
    /// # Errors
    /// The backend's rollback failure.
    pub fn rollback(&mut self) -> Result<bool, SqlDbdError> {
        self.end_transaction(false)
    }

    fn end_transaction(&mut self, commit: bool) -> Result<bool, SqlDbdError> {
        let mut session = self.session.borrow_mut();
        if !session.capabilities.transactions {
            return Ok(false);
        }
        let Session {
            driver,
            in_transaction,
            ..
        } = &mut *session;
        let Some(driver) = driver.as_mut() else {
            return Ok(false);
        };
        if !*in_transaction {
            return Ok(true);
        }

        if commit {
            driver.commit()?;
            *in_transaction = false;
        } else {
            // A failed rollback still leaves no transaction to resume.
            *in_transaction = false;
            driver.rollback()?;
        }
        debug!(
            driver = self.driver,
            action = if commit { "commit" } else { "rollback" },
            "ended transaction"
        );
        Ok(true)
    }

    /// Cheap liveness check; `false` on a closed connection.
    #[must_use]
    pub fn ping(&self) -> bool {
        self.session
            .borrow_mut()
            .driver
            .as_mut()
            .is_some_and(|driver| driver.ping())
    }

    /// Escape `text` for use inside a single-quoted SQL literal.
    ///
    /// The result is not wrapped in quotes.
    ///
    /// # Errors
    /// `SqlDbdError::DbUnavailable` on a closed connection, `NotImplemented` for backends
    /// without an escaping helper.
    pub fn quote(&self, text: &str) -> Result<String, SqlDbdError> {
        self.session
            .borrow()
            .driver
            .as_ref()
            .ok_or(SqlDbdError::DbUnavailable)?
            .quote(text)
    }

    /// Row id of the most recent insert.
    ///
    /// # Errors
    /// `SqlDbdError::DbUnavailable` on a closed connection, `NotImplemented` for backends
    /// that do not track it.
    pub fn last_id(&self) -> Result<i64, SqlDbdError> {
        self.session
            .borrow()
            .driver
            .as_ref()
            .ok_or(SqlDbdError::DbUnavailable)?
            .last_id()
    }

    /// Roll back any open transaction and release the native handle.
    ///
    /// Never fails; calling it again does nothing.
    pub fn close(&mut self) {
        let mut session = self.session.borrow_mut();
        let Some(mut driver) = session.driver.take() else {
            return;
        };
        if session.in_transaction {
            warn!(
                driver = self.driver,
                "closing connection with an open transaction; rolling back"
            );
            if let Err(err) = driver.rollback() {
                warn!(driver = self.driver, error = %err, "rollback on close failed");
            }
            session.in_transaction = false;
        }
        driver.close();
        debug!(driver = self.driver, "closed connection");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_closed() { "closed" } else { "open" };
        write!(f, "{} connection: {state}", self.driver)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.session.borrow();
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("closed", &session.is_closed())
            .field("autocommit", &session.autocommit)
            .field("in_transaction", &session.in_transaction)
            .finish()
    }
}
