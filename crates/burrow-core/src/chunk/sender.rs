//! Paced, ordered chunk delivery with bounded retry.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::constants::{
    CHUNK_RETRY_BACKOFF, DEFAULT_CHUNK_BYTES, DEFAULT_CHUNK_RETRIES, INTER_CHUNK_DELAY,
};
use crate::Result;

use super::chunk_message;

/// Ordered text delivery to one destination, supplied by the
/// surrounding transport layer. The implementation must deliver calls
/// in invocation order.
#[async_trait]
pub trait OrderedTransport: Send + Sync {
    async fn send_text(&self, destination: &str, text: &str) -> Result<()>;
}

/// Splits one outbound message and delivers the pieces strictly in
/// order, pacing between sends so chunks keep their order on transports
/// without reassembly.
///
/// A chunk that still fails after the configured retries aborts the
/// remaining chunks and surfaces the error to the caller; the failure
/// is fatal to that message only, never to the session.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    /// Per-chunk UTF-8 byte budget.
    pub chunk_bytes: usize,
    /// Pause after each chunk.
    pub pacing: Duration,
    /// Retry attempts per chunk beyond the first try.
    pub retries: u32,
    /// Pause before each retry.
    pub retry_backoff: Duration,
}

impl Default for ChunkSender {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            pacing: INTER_CHUNK_DELAY,
            retries: DEFAULT_CHUNK_RETRIES,
            retry_backoff: CHUNK_RETRY_BACKOFF,
        }
    }
}

impl ChunkSender {
    /// Deliver `text` to `destination` as an ordered chunk sequence.
    pub async fn send(
        &self,
        transport: &dyn OrderedTransport,
        destination: &str,
        text: &str,
    ) -> Result<()> {
        let chunks = chunk_message(text, self.chunk_bytes);
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                debug!(
                    destination,
                    chunk = i + 1,
                    total,
                    attempt,
                    bytes = chunk.len(),
                    "sending chunk"
                );
                match transport.send_text(destination, chunk).await {
                    Ok(()) => {
                        sleep(self.pacing).await;
                        break;
                    }
                    Err(e) if attempt <= self.retries => {
                        warn!(
                            destination,
                            chunk = i + 1,
                            attempt,
                            error = %e,
                            "chunk send failed, retrying"
                        );
                        sleep(self.retry_backoff).await;
                    }
                    Err(e) => {
                        warn!(
                            destination,
                            chunk = i + 1,
                            total,
                            error = %e,
                            "chunk send failed, aborting message"
                        );
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }
}
