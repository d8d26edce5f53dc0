use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Error reported by the server for a failed statement.
///
/// Keeps the raw SQLSTATE and message so callers can diagnose without the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Five-character SQLSTATE code, e.g. `23505`.
    pub code: String,
    /// Human-readable server message.
    pub message: String,
}

impl ServerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SQLSTATE {})", self.message, self.code)
    }
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unknown host: {0}")]
    UnknownHost(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(ServerError),

    #[error("Unknown field: {0}")]
    UnknownField(ServerError),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(ServerError),

    #[error("Query error: {0}")]
    Query(ServerError),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Statement did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Session busy: {0}")]
    Busy(String),
}

impl DataSourceError {
    /// The server error behind a statement failure, if this is one.
    #[must_use]
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::UnknownCollection(err)
            | Self::UnknownField(err)
            | Self::DuplicateEntry(err)
            | Self::Query(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        self.server_error().map(|err| err.code.as_str())
    }
}
