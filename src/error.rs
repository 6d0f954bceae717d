use thiserror::Error;

/// Failure categories shared by every backend.
///
/// Callers that only care about the category (and not the driver's diagnostic text) can
/// match on [`SqlDbdError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionFailed,
    DbUnavailable,
    PrepareFailed,
    ParamCountMismatch,
    BindingTypeUnsupported,
    BindingFailed,
    ExecuteFailed,
    FetchBeforeExecute,
    FetchFailed,
    InvalidStatement,
    UnknownResultKind,
    NotImplemented,
    Config,
}

#[derive(Debug, Error)]
pub enum SqlDbdError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Database not available")]
    DbUnavailable,

    #[error("Error preparing statement handle: {0}")]
    PrepareFailed(String),

    #[error("Statement expected {expected} parameters but received {received}")]
    ParamCountMismatch { expected: usize, received: usize },

    #[error("Unknown or unsupported type `{type_name}` for parameter {position}")]
    BindingTypeUnsupported {
        position: usize,
        type_name: &'static str,
    },

    #[error("Error binding statement parameters: {0}")]
    BindingFailed(String),

    #[error("Error executing statement: {0}")]
    ExecuteFailed(String),

    #[error("Fetch called before execute")]
    FetchBeforeExecute,

    #[error("Error fetching result: {0}")]
    FetchFailed(String),

    #[error("Invalid statement handle")]
    InvalidStatement,

    #[error("Unknown push type in result set: {0}")]
    UnknownResultKind(String),

    #[error("Method {method} is not implemented by {driver}")]
    NotImplemented {
        driver: &'static str,
        method: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlDbdError {
    /// Category of this error, without the driver diagnostic.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqlDbdError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            SqlDbdError::DbUnavailable => ErrorKind::DbUnavailable,
            SqlDbdError::PrepareFailed(_) => ErrorKind::PrepareFailed,
            SqlDbdError::ParamCountMismatch { .. } => ErrorKind::ParamCountMismatch,
            SqlDbdError::BindingTypeUnsupported { .. } => ErrorKind::BindingTypeUnsupported,
            SqlDbdError::BindingFailed(_) => ErrorKind::BindingFailed,
            SqlDbdError::ExecuteFailed(_) => ErrorKind::ExecuteFailed,
            SqlDbdError::FetchBeforeExecute => ErrorKind::FetchBeforeExecute,
            SqlDbdError::FetchFailed(_) => ErrorKind::FetchFailed,
            SqlDbdError::InvalidStatement => ErrorKind::InvalidStatement,
            SqlDbdError::UnknownResultKind(_) => ErrorKind::UnknownResultKind,
            SqlDbdError::NotImplemented { .. } => ErrorKind::NotImplemented,
            SqlDbdError::ConfigError(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn not_implemented(driver: &'static str, method: &'static str) -> Self {
        SqlDbdError::NotImplemented { driver, method }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strips_diagnostic() {
        let err = SqlDbdError::ExecuteFailed("no such table: t".into());
        assert_eq!(err.kind(), ErrorKind::ExecuteFailed);
        assert_eq!(
            err.to_string(),
            "Error executing statement: no such table: t"
        );
    }

    #[test]
    fn binding_type_message_names_type_and_position() {
        let err = SqlDbdError::BindingTypeUnsupported {
            position: 2,
            type_name: "table",
        };
        assert_eq!(err.kind(), ErrorKind::BindingTypeUnsupported);
        assert!(err.to_string().contains("`table`"));
        assert!(err.to_string().contains("parameter 2"));
    }
}
