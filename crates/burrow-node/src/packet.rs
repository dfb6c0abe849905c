//! Extracting text and sender identity from device packet events.
//!
//! Packet shapes vary between firmware versions and bridge layers, so
//! both extractors are extract-or-none: a packet that does not carry a
//! usable field is simply not for us.

use serde_json::Value;

/// The message text of a packet, if it carries one.
///
/// Checked in order: `decoded.text`, `decoded.payload` (a UTF-8 string
/// or a byte array, decoded lossily), then a top-level `text`.
pub fn extract_text(packet: &Value) -> Option<String> {
    if let Some(decoded) = packet.get("decoded") {
        if let Some(text) = decoded.get("text").and_then(Value::as_str) {
            return Some(text.to_string());
        }
        if let Some(payload) = decoded.get("payload") {
            if let Some(s) = payload.as_str() {
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
            if let Some(items) = payload.as_array() {
                let bytes: Vec<u8> = items
                    .iter()
                    .filter_map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect();
                if !bytes.is_empty() && bytes.len() == items.len() {
                    return Some(String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }
    }
    packet
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// The sender identity of a packet: first non-empty string among
/// `fromId`, `from`, `sender`, `src`.
pub fn extract_sender(packet: &Value) -> Option<String> {
    ["fromId", "from", "sender", "src"].iter().find_map(|key| {
        packet
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
