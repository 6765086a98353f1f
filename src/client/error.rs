//! Error types for API client operations.

use thiserror::Error;

/// Errors that can occur while talking to the ticketing API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Attempt exceeded its deadline and was aborted.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Backend answered with a non-2xx status.
    #[error("HTTP error {status}: {status_text}")]
    Status { status: u16, status_text: String },

    /// Response body doesn't match the `{ data, success }` envelope.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Request could not be built (bad URL, unserializable body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used for metric and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "network",
            ApiError::Timeout(_) => "timeout",
            ApiError::Status { .. } => "status",
            ApiError::Decode(_) => "decode",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }
}
