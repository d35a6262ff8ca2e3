use crate::client::HttpError;

/// Errors surfaced by the dataflow core.
///
/// Remote and database failures are propagated unchanged; the core never
/// retries. Callers decide on backoff via [`DataflowError::is_retryable`].
#[derive(Debug, thiserror::Error)]
pub enum DataflowError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    RemoteError(#[from] HttpError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl DataflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Remote and storage failures are transient from the caller's point of view.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            DataflowError::RemoteError(e) => e.is_retryable(),
            DataflowError::DatabaseError(_) => true,
            _ => false,
        }
    }
}

impl From<config::ConfigError> for DataflowError {
    fn from(err: config::ConfigError) -> Self {
        DataflowError::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataflowError>;
