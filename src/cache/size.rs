//! Size Estimation Module
//!
//! Approximates the in-memory byte footprint of cached values for the
//! global byte budget. Estimates are coarse by design: the budget bounds
//! growth, it does not meter allocations.

use serde_json::Value;

/// Estimate charged when a value cannot be serialized.
pub const FALLBACK_SIZE: u64 = 1024; // 1 KiB

// == Estimation ==
/// Estimates the byte footprint of a value.
///
/// Rules:
/// - strings: 2 bytes per character
/// - numbers: 8 bytes
/// - booleans: 4 bytes
/// - byte buffers (arrays of integers in `0..=255`): their length
/// - anything else: serialized textual form at 2 bytes per character,
///   falling back to [`FALLBACK_SIZE`] if serialization fails
pub fn estimate_size(value: &Value) -> u64 {
    match value {
        Value::String(s) => (s.chars().count() * 2) as u64,
        Value::Number(_) => 8,
        Value::Bool(_) => 4,
        Value::Array(items) if is_byte_buffer(items) => items.len() as u64,
        other => match serde_json::to_string(other) {
            Ok(text) => (text.chars().count() * 2) as u64,
            Err(_) => FALLBACK_SIZE,
        },
    }
}

/// Binary data serializes to an array of integers in byte range; charge it
/// one byte per element instead of its much larger textual form.
fn is_byte_buffer(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_u64().map_or(false, |n| n <= u8::MAX as u64))
}
