// Error types
// Every failure the library can report is one of these variants

use thiserror::Error;

/// Errors raised while building or running a query
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The backend could not be reached (or rejected our credentials)
    /// within the configured delay
    #[error("Connection error: {0}")]
    Connection(String),

    /// Bad input detected before anything was sent to a backend
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend rejected a well-formed query
    #[error("Backend execution error: {0}")]
    BackendExecution(String),

    /// The configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl QueryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        QueryError::InvalidArgument(msg.into())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, QueryError>;
