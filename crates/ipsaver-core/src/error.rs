//! Error types for the IP status monitor
//!
//! This module defines all error types used throughout the crate.
//!
//! Only [`Error::Startup`] is fatal. Fetch failures are absorbed per address
//! family, persistence failures abandon a single cycle, and a corrupt status
//! file is never surfaced as an error at all (see [`crate::state`]).

use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IP status monitor
#[derive(Error, Debug)]
pub enum Error {
    /// The persistence location could not be resolved or created
    #[error("Startup error: {0}")]
    Startup(String),

    /// Connection, timeout or non-2xx response from a lookup service
    #[error("Network error: {0}")]
    Network(String),

    /// Lookup service body was not an address literal
    #[error("Parse error: {0}")]
    Parse(String),

    /// Lookup service answered with the other address family
    #[error("Wrong address family: expected {expected}, got {actual}")]
    WrongFamily {
        /// Family the endpoint is supposed to return
        expected: &'static str,
        /// Address actually returned
        actual: String,
    },

    /// Status store errors (write/rename/serialize)
    #[error("Status store error: {0}")]
    StatusStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a startup error
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a status store error
    pub fn status_store(msg: impl Into<String>) -> Self {
        Self::StatusStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from resolving an address
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Parse(_) | Self::WrongFamily { .. }
        )
    }
}
