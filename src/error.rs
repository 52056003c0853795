//! Error types for long-running query execution

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for LRQ operations
pub type Result<T> = std::result::Result<T, LrqError>;

/// Main error type for LRQ operations
#[derive(Error, Debug)]
pub enum LrqError {
    /// Cancellation fired while waiting for a rate-limit permit.
    /// No request was sent for the step that was waiting.
    #[error("Cancelled while waiting for a rate-limit permit")]
    RateLimitCancelled,

    /// Network-level failure sending or receiving a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered a submit or poll with a non-2xx status
    #[error("{}", query_failed_message(.status, .message))]
    QueryFailed {
        status: StatusCode,
        message: Option<String>,
    },

    /// Malformed response envelope or result payload
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request was rejected locally before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn query_failed_message(status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("unsuccessful ({}) status code: {}", status.as_u16(), message),
        None => format!("unsuccessful ({}) status code", status.as_u16()),
    }
}

impl LrqError {
    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LrqError::RateLimitCancelled | LrqError::Transport(_))
    }
}

impl From<reqwest::Error> for LrqError {
    fn from(err: reqwest::Error) -> Self {
        LrqError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for LrqError {
    fn from(err: serde_json::Error) -> Self {
        LrqError::Decode(err.to_string())
    }
}
