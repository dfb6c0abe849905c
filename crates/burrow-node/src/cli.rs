//! Command-line interface for the node binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use burrow_core::chunk::ChunkSender;
use burrow_core::constants::DEFAULT_CHUNK_BYTES;
use burrow_core::session::StoreConfig;
use burrow_core::LogFormat;

/// Gopher browsing over short ordered text messages.
#[derive(Debug, Parser)]
#[command(name = "burrow-node", version, about)]
pub struct Args {
    /// Mesh bridge TCP host.
    #[arg(long, env = "MESH_HOST", default_value = "localhost")]
    pub mesh_host: String,

    /// Mesh bridge TCP port.
    #[arg(long, env = "MESH_PORT", default_value_t = 4403)]
    pub mesh_port: u16,

    /// Read `identity<TAB>command` lines from stdin instead of
    /// connecting to a mesh bridge; replies print to stdout.
    #[arg(long)]
    pub stdio: bool,

    /// Per-chunk UTF-8 byte budget for outbound replies.
    #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
    pub chunk_bytes: usize,

    /// Retry attempts per chunk beyond the first try.
    #[arg(long, default_value_t = 0)]
    pub chunk_retries: u32,

    /// Drop sessions idle longer than this many seconds; unset keeps
    /// them for the process lifetime.
    #[arg(long)]
    pub session_linger_secs: Option<u64>,

    /// Increase verbosity (-v, -vv, ...).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to a file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            linger: self.session_linger_secs.map(Duration::from_secs),
            ..StoreConfig::default()
        }
    }

    pub fn chunk_sender(&self) -> ChunkSender {
        ChunkSender {
            chunk_bytes: self.chunk_bytes,
            retries: self.chunk_retries,
            ..ChunkSender::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["burrow-node"]);
        assert_eq!(args.mesh_port, 4403);
        assert!(!args.stdio);
        assert_eq!(args.chunk_bytes, DEFAULT_CHUNK_BYTES);
        assert!(args.store_config().linger.is_none());
    }

    #[test]
    fn linger_flag_arms_eviction() {
        let args = Args::parse_from(["burrow-node", "--session-linger-secs", "600"]);
        assert_eq!(
            args.store_config().linger,
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn chunk_flags_shape_the_sender() {
        let args = Args::parse_from(["burrow-node", "--chunk-bytes", "120", "--chunk-retries", "2"]);
        let sender = args.chunk_sender();
        assert_eq!(sender.chunk_bytes, 120);
        assert_eq!(sender.retries, 2);
    }
}
