//! Memocache - namespace-partitioned caching for expensive computations
//!
//! An in-process cache with TTL expiration, a global byte budget, and
//! cross-namespace LRU eviction; a family of memoization wrappers that
//! apply it declaratively around async computations; and an independent
//! file-backed cache with content-integrity verification for state that
//! must survive restarts.

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod memo;
pub mod persist;
pub mod tasks;

pub use cache::{Cache, CacheStats, CacheStore, SizeInfo};
pub use config::Config;
pub use error::{CacheError, Result};
pub use keys::generate_key;
pub use memo::{CacheEvict, CachePolicy, CachePut, Cacheable, CacheableBatch, KeySpec, StatsLogged};
pub use persist::{FileCacheStats, FileCacheStrategy};
pub use tasks::spawn_cleanup_task;
