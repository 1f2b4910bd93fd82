//! Key Derivation Module
//!
//! Derives deterministic cache keys, on-disk filenames, and content hashes
//! from arbitrary serializable values.
//!
//! All three functions hash a canonical JSON rendering with md5 and return
//! the 32-character lowercase hex digest. serde_json keeps object keys
//! sorted, so structurally equal values serialize identically regardless of
//! construction order.

use serde_json::Value;

// == Key Generation ==
/// Derives a stable cache key from an ordered list of parts.
///
/// Two calls with structurally equal part lists (same values, same order)
/// return the same key. This is the default key used by the memoization
/// wrappers unless the caller supplies an explicit key or a key generator.
///
/// # Arguments
/// * `parts` - The ordered values to derive the key from
pub fn generate_key(parts: &[Value]) -> String {
    let canonical =
        serde_json::to_string(parts).unwrap_or_else(|_| format!("{:?}", parts));
    format!("{:x}", md5::compute(canonical))
}

// == Filename Hashing ==
/// Hashes a logical key into a fixed-length filename stem.
///
/// The file-backed store names each entry file `<hash_key(key)>.json`.
pub fn hash_key(key: &str) -> String {
    format!("{:x}", md5::compute(key))
}

// == Content Hashing ==
/// Hashes the serialized form of a value.
///
/// The file-backed store records this hash alongside each persisted value and
/// recomputes it on every read; a mismatch means the on-disk bytes were
/// corrupted or tampered with.
pub fn content_hash(value: &Value) -> String {
    let serialized =
        serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value));
    format!("{:x}", md5::compute(serialized))
}
