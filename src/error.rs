//! Error types for backend queries.

use thiserror::Error;

/// Errors that can occur while talking to the metrics backend.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Connection, DNS or TLS failure reaching the backend.
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Per-call deadline exceeded.
    #[error("Backend request timed out")]
    Timeout,

    /// Response shape did not match the expected vector/scalar type.
    #[error("Malformed backend result: {0}")]
    MalformedResult(String),
}

impl QueryError {
    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::BackendUnreachable(_) => "unreachable",
            QueryError::Timeout => "timeout",
            QueryError::MalformedResult(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout
        } else if err.is_connect() || err.is_request() {
            QueryError::BackendUnreachable(err.to_string())
        } else {
            QueryError::MalformedResult(err.to_string())
        }
    }
}
