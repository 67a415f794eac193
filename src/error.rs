//! Error types for the agent chat stream

use thiserror::Error;

/// Main error type for transport and configuration failures
///
/// These errors never cross the [`StreamManager`](crate::StreamManager)
/// boundary: the manager logs them and folds them into session state.
#[derive(Error, Debug)]
pub enum ChatStreamError {
    /// Could not establish the stream with the orchestrator
    #[error("Connection error: {0}")]
    Connection(String),

    /// Orchestrator answered the handshake with a non-success status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Transport failed after the stream was open
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, ChatStreamError>;

impl ChatStreamError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, msg: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: msg.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ChatStreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::Connection(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Reasons a single frame was rejected by the decoder
///
/// Decode errors are recovered locally: the frame is dropped and the
/// session keeps streaming.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame body is not valid JSON
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Frame carries no event name and no in-band discriminant
    #[error("frame has no event discriminant")]
    MissingDiscriminant,

    /// Discriminant is not one this client understands
    #[error("unknown event type '{0}'")]
    UnknownType(String),

    /// Known event type with missing or mistyped fields
    #[error("malformed '{kind}' frame: {source}")]
    Malformed {
        /// Event discriminant
        kind: &'static str,
        /// Underlying field error
        #[source]
        source: serde_json::Error,
    },

    /// Timestamp present but not RFC 3339 or epoch milliseconds
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}
