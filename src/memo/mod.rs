//! Memoization Module
//!
//! Higher-order wrappers that route caller-supplied computations through
//! the cache: read-through ([`Cacheable`]), invalidation ([`CacheEvict`]),
//! write-through ([`CachePut`]), per-item batch read-through
//! ([`CacheableBatch`]), and a statistics-logging passthrough
//! ([`StatsLogged`]). All of them take the cache by handle; none reach
//! for globals.

mod batch;
mod policy;
mod wrappers;

pub use batch::{CacheableBatch, DEFAULT_BATCH_SIZE};
pub use policy::{CachePolicy, KeySpec};
pub use wrappers::{CacheEvict, CachePut, Cacheable, StatsLogged};
