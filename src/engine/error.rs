//! Query engine errors

use std::fmt;

/// Errors that can occur while fetching a raw result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The request never produced a response
    Transport {
        endpoint: String,
        message: String,
    },
    /// The backend answered with a non-success status
    Status {
        endpoint: String,
        status: u16,
    },
    /// The response body is not a valid raw result
    MalformedResponse {
        endpoint: String,
        message: String,
    },
    /// The request was cancelled before completion
    Cancelled,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { endpoint, message } => {
                write!(f, "Request to '{}' failed: {}", endpoint, message)
            }
            Self::Status { endpoint, status } => {
                write!(f, "Endpoint '{}' responded with status {}", endpoint, status)
            }
            Self::MalformedResponse { endpoint, message } => {
                write!(f, "Malformed response from '{}': {}", endpoint, message)
            }
            Self::Cancelled => write!(f, "Query was cancelled"),
        }
    }
}

impl std::error::Error for QueryError {}
