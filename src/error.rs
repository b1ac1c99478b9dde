//! Error types for logfollow.

use thiserror::Error;

/// Common error type for logfollow.
#[derive(Error, Debug)]
pub enum FollowError {
    /// Network or server failure on either the status or the entries query.
    ///
    /// Covers transport errors, timeouts, non-success HTTP statuses and
    /// oversized bodies.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Response decoded but did not match the expected shape or contract.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),
}

impl FollowError {
    /// Whether this error is absorbed by the poll loop as a `NoChange` cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, FollowError::Fetch(_) | FollowError::MalformedResponse(_))
    }
}

impl From<serde_json::Error> for FollowError {
    fn from(e: serde_json::Error) -> Self {
        FollowError::MalformedResponse(e.to_string())
    }
}

/// Result type alias for logfollow operations.
pub type Result<T> = std::result::Result<T, FollowError>;
