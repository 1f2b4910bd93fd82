//! Error types for the caching engine
//!
//! Provides unified error handling using thiserror.
//!
//! These errors never cross the public cache API: read and write paths catch
//! them, log, and degrade to a miss or a no-op. They exist so the internal
//! file-store helpers compose with `?`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value or manifest could not be serialized or parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted bytes do not match their recorded content hash
    #[error("integrity check failed for '{key}': expected {expected}, got {actual}")]
    Integrity {
        key: String,
        expected: String,
        actual: String,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the caching engine.
pub type Result<T> = std::result::Result<T, CacheError>;
