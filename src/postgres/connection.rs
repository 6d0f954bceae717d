use std::rc::Rc;

use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use super::config::PostgresOptions;
use super::pg_message;
use super::statement::PostgresStatement;
use crate::adapter::{Capabilities, DriverConnection, DriverStatement};
use crate::error::SqlDbdError;
use crate::marshal::BindPolicy;
use crate::translation::PlaceholderStyle;

const CAPABILITIES: Capabilities = Capabilities {
    driver: "postgres",
    placeholders: PlaceholderStyle::Dollar,
    transactions: true,
    bind: BindPolicy {
        integer_binding: true,
    },
};

/// A client together with the runtime its futures run on.
///
/// The runtime is current-thread, so the background connection task only makes progress
/// inside `block_on`; every client call goes through [`PgSession::block_on`].
pub(crate) struct PgSession {
    runtime: Runtime,
    pub(crate) client: Client,
}

impl PgSession {
    pub(crate) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Native `PostgreSQL` connection.
pub struct PostgresConnection {
    session: Option<Rc<PgSession>>,
}

impl PostgresConnection {
    /// # Errors
    /// `SqlDbdError::ConnectionFailed` with the server's diagnostic.
    pub fn open(opts: &PostgresOptions) -> Result<Self, SqlDbdError> {
        let config = opts.pg_config()?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SqlDbdError::ConnectionFailed(format!("runtime: {e}")))?;

        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| SqlDbdError::ConnectionFailed(pg_message(&e)))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection task ended with an error");
            }
        });
        debug!(
            host = ?config.get_hosts().first(),
            dbname = config.get_dbname(),
            "connected to postgres"
        );

        Ok(Self {
            session: Some(Rc::new(PgSession { runtime, client })),
        })
    }

    fn session(&self) -> Result<&Rc<PgSession>, SqlDbdError> {
        self.session.as_ref().ok_or(SqlDbdError::DbUnavailable)
    }

    fn batch(&self, sql: &str) -> Result<(), SqlDbdError> {
        let session = self.session()?;
        session
            .block_on(session.client.batch_execute(sql))
            .map_err(|e| SqlDbdError::ExecuteFailed(pg_message(&e)))
    }
}

impl DriverConnection for PostgresConnection {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>, SqlDbdError> {
        let session = self.session()?;
        Ok(Box::new(PostgresStatement::prepare(session, sql)?))
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
        match &self.session {
            Some(session) if !session.client.is_closed() => self.batch("").is_ok(),
            _ => false,
        }
    }

    fn quote(&self, text: &str) -> Result<String, SqlDbdError> {
        self.session()?;
        Ok(text.replace('\'', "''"))
    }

    fn close(&mut self) {
        // Dropping the client ends the connection task; dropping the runtime reaps it.
        self.session = None;
    }
}
