//! Persistence Module
//!
//! File-backed caching that survives process restarts: an on-disk
//! manifest ([`CacheIndex`]) plus the entry-per-file store built on it
//! ([`FileCacheStrategy`]).

mod index;
mod strategy;

pub use index::{CacheIndex, IndexEntry, INDEX_FILE};
pub use strategy::{FileCacheStats, FileCacheStrategy};
