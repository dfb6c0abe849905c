//! burrow-core: Shared library for Gopher browsing over ordered-message
//! transports.
//!
//! This crate provides:
//! - Gopher URL parsing and the transaction client (classic and Gopher+)
//! - Search query construction from Gopher+ field declarations
//! - Per-user navigation sessions with history and pagination
//! - Chunked, paced, ordered delivery of rendered output
//! - Logging setup

pub mod chunk;
pub mod constants;
pub mod error;
pub mod gopher;
pub mod logging;
pub mod search;
pub mod session;
pub mod url;

pub use error::{Error, Result};
pub use logging::{LogFormat, init_logging};
