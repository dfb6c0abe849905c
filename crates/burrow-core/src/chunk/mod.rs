//! Splitting rendered output into transport-safe chunks.
//!
//! The downstream message transport carries at most
//! [`MAX_CHUNK_BYTES`](crate::constants::MAX_CHUNK_BYTES) UTF-8 bytes
//! per frame and has no reassembly, so long output is cut into ordered
//! pieces at content-aware break points: last newline, else last
//! whitespace, else the byte ceiling. Cuts never land inside a
//! multi-byte code point.

mod sender;

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{MAX_CHUNK_BYTES, MIN_DANGLING_LINE_CHARS};

pub use sender::{ChunkSender, OrderedTransport};

static TRAILING_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n[ \t]*)+$").expect("static regex"));
static LEADING_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[ \t]*\r?\n)+").expect("static regex"));

/// Split `message` into ordered chunks of at most `chunk_size` UTF-8
/// bytes (capped by the protocol ceiling).
///
/// Always returns at least one element; empty input yields `[""]`.
/// Each emitted chunk is trimmed of leading/trailing blank lines and
/// stray carriage returns, with interior spacing preserved.
pub fn chunk_message(message: &str, chunk_size: usize) -> Vec<String> {
    let max_bytes = chunk_size.clamp(1, MAX_CHUNK_BYTES);
    if message.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::new();
    let mut idx = 0;
    let len = message.len();

    while idx < len {
        let window_end = utf8_window_end(message, idx, max_bytes);
        let window = &message[idx..window_end];

        let raw = if window_end >= len {
            idx = window_end;
            window
        } else {
            let mut split = find_split_index(window);
            split = remove_trailing_blank_lines(window, split);
            split = avoid_short_last_line(window, split);
            let split = split.min(window.len()).max(first_char_len(window));
            idx += split;
            &window[..split]
        };

        let cleaned = trim_chunk_edges(raw);
        if !cleaned.is_empty() {
            chunks.push(cleaned);
        }
    }

    if chunks.is_empty() {
        vec![String::new()]
    } else {
        chunks
    }
}

/// End (byte index) of the largest window starting at `start` that
/// stays within `max_bytes` without splitting a code point. Always
/// advances by at least one character.
fn utf8_window_end(text: &str, start: usize, max_bytes: usize) -> usize {
    let slice = &text[start..];
    let mut end = 0;
    for (pos, ch) in slice.char_indices() {
        let next = pos + ch.len_utf8();
        if next > max_bytes {
            break;
        }
        end = next;
    }
    if end == 0 {
        // A single code point wider than the budget still has to move.
        end = first_char_len(slice);
    }
    start + end
}

fn first_char_len(s: &str) -> usize {
    s.chars().next().map_or(1, char::len_utf8)
}

/// Preferred break point within a full window: just after the last
/// newline, else just after the last space/tab, else the window end.
fn find_split_index(window: &str) -> usize {
    if let Some(nl) = window.rfind('\n') {
        if nl > 0 {
            return nl + 1;
        }
    }
    if let Some(ws) = window.rfind([' ', '\t']) {
        return ws + 1;
    }
    window.len()
}

/// Pull the break point back over any blank lines it would leave at
/// the end of the cut piece.
fn remove_trailing_blank_lines(window: &str, split: usize) -> usize {
    if split == 0 {
        return split;
    }
    let trimmed = TRAILING_BLANK.replace(&window[..split], "");
    if trimmed.is_empty() {
        split
    } else {
        trimmed.len()
    }
}

/// Avoid stranding a final line shorter than
/// [`MIN_DANGLING_LINE_CHARS`] when an earlier line break exists.
fn avoid_short_last_line(window: &str, split: usize) -> usize {
    if split == 0 {
        return split;
    }
    let slice = window[..split].trim_end_matches(['\r', '\n']);
    if slice.is_empty() {
        return split;
    }
    let Some(nl) = slice.rfind('\n') else {
        return split;
    };
    let last_line_chars = slice[nl + 1..].chars().filter(|c| *c != '\r').count();
    if last_line_chars < MIN_DANGLING_LINE_CHARS {
        nl + 1
    } else {
        split
    }
}

/// Drop blank lines from both edges of a finished chunk, plus stray
/// carriage returns, keeping intentional interior spacing.
fn trim_chunk_edges(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let trimmed = LEADING_BLANK.replace(text, "");
    let trimmed = TRAILING_BLANK.replace(&trimmed, "");
    trimmed.trim_matches('\r').to_string()
}
