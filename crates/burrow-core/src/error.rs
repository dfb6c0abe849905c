//! Error types for burrow-core.
//!
//! Only genuine failures live here. State-machine validation outcomes
//! (selecting off-page, searching with no pending endpoint) are
//! user-facing strings produced by the session layer, never `Error`
//! values.

use thiserror::Error;

/// Main error type for burrow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL could not be parsed as a gopher:// URL.
    #[error("malformed URL: {message}")]
    MalformedUrl { message: String },

    /// Connection attempt or read timed out.
    #[error("operation timed out")]
    Timeout,

    /// Outbound transport failure (chunk delivery).
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl Error {
    /// Shorthand for a transport-layer failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    /// Shorthand for a malformed-URL failure.
    pub fn malformed_url(message: impl Into<String>) -> Self {
        Error::MalformedUrl {
            message: message.into(),
        }
    }
}

/// Convenience result type for burrow operations.
pub type Result<T> = std::result::Result<T, Error>;
