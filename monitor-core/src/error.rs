//! Error types for the monitor

use thiserror::Error;

/// Monitor-wide error type
///
/// Per-account fetch failures are not errors: they are classified into
/// [`crate::OutcomeStatus`] and carried inside the balance record. This type
/// covers the remaining genuine error paths (signing preconditions, payload
/// parsing, roster configuration).
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    pub fn signing(msg: impl Into<String>) -> Self {
        MonitorError::Signing(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        MonitorError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Config(msg.into())
    }
}

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;
