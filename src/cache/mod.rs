//! Cache Module
//!
//! Provides namespace-partitioned in-memory caching with TTL expiration,
//! a global byte budget, and cross-namespace LRU eviction.

mod entry;
mod handle;
mod lru;
mod size;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use handle::Cache;
pub use lru::LruTracker;
pub use size::{estimate_size, FALLBACK_SIZE};
pub use stats::{CacheStats, SizeInfo};
pub use store::CacheStore;

// == Public Constants ==
/// Global byte budget applied when none is configured
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024; // 100 MiB

/// Namespace used when callers do not name one
pub const DEFAULT_NAMESPACE: &str = "default";
