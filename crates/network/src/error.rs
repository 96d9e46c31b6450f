//! Error types for talking to the race server

use crate::protocol::ErrorCode;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while calling the race server
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not complete (DNS, connection, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The server address or path did not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with an `err` document
    #[error("Error {}: {message}", code_number(.code))]
    Protocol {
        message: String,
        code: Option<ErrorCode>,
    },

    /// The response was not the JSON document we expected
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn code_number(code: &Option<ErrorCode>) -> i64 {
    code.map(i64::from).unwrap_or(0)
}

impl NetworkError {
    /// Returns true if the request never produced a server answer
    pub fn is_transport(&self) -> bool {
        matches!(self, NetworkError::Http(_) | NetworkError::Status { .. })
    }

    /// Returns the protocol error code, if the server sent one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            NetworkError::Protocol { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true if the server said the entry does not exist
    pub fn is_no_entry(&self) -> bool {
        self.code() == Some(ErrorCode::NoEntry)
    }
}
