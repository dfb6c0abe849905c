//! Protocol and configuration constants for burrow.

use std::time::Duration;

// =============================================================================
// Gopher Protocol Constants
// =============================================================================

/// Default Gopher TCP port.
pub const DEFAULT_GOPHER_PORT: u16 = 70;

/// Idle timeout for Gopher socket reads. The protocol has no length
/// framing, so end-of-stream and the `.` terminator are the only end
/// signals; a stalled peer ends the read after this long.
pub const SOCKET_TIMEOUT: Duration = Duration::from_secs(15);

/// Item type characters the URL parser recognizes. Anything else folds
/// back into the selector with type `1`.
pub const KNOWN_ITEM_TYPES: &str = "0123456789+ghIisTtP;,dcruwWXsM";

// =============================================================================
// Pagination Constants
// =============================================================================

/// Selectable menu entries shown per page.
pub const MENU_PAGE_SIZE: usize = 10;

/// Text file lines shown per page.
pub const FILE_PAGE_SIZE: usize = 20;

// =============================================================================
// Chunk Transport Constants
// =============================================================================

/// Absolute ceiling on a single chunk's UTF-8 byte length. The
/// downstream message transport cannot carry more in one frame.
pub const MAX_CHUNK_BYTES: usize = 200;

/// Default per-chunk byte budget (leaves headroom under the ceiling).
pub const DEFAULT_CHUNK_BYTES: usize = 190;

/// A cut never strands a final line shorter than this many characters
/// when an earlier break point exists.
pub const MIN_DANGLING_LINE_CHARS: usize = 5;

/// Pause between consecutive chunks of one message, so ordering holds
/// on transports without reassembly.
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(1200);

/// Backoff before retrying a failed chunk send.
pub const CHUNK_RETRY_BACKOFF: Duration = Duration::from_millis(1500);

/// Default per-chunk retry attempts before the whole send fails.
pub const DEFAULT_CHUNK_RETRIES: u32 = 0;

// =============================================================================
// Session Store Constants
// =============================================================================

/// Interval between idle-session sweeps when eviction is enabled.
pub const STORE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_budget_under_ceiling() {
        assert!(DEFAULT_CHUNK_BYTES <= MAX_CHUNK_BYTES);
    }

    #[test]
    fn known_types_cover_browsing_set() {
        for t in ['0', '1', '7', 'T', 'i'] {
            assert!(KNOWN_ITEM_TYPES.contains(t));
        }
    }
}
