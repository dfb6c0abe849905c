//! Node-side glue: inbound packet events become session commands, and
//! session replies go back out through the chunked transport.

pub mod cli;
pub mod dispatch;
pub mod packet;

pub use dispatch::Navigator;
