//! Cache Statistics Module
//!
//! Tracks per-namespace cache performance metrics and global size usage.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics for one namespace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to reclaim budget
    pub evictions: u64,
    /// Cumulative bytes ever stored in this namespace (not current usage)
    pub size: u64,
    /// Current number of entries in the namespace
    pub entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Stored Bytes ==
    /// Adds newly stored bytes to the cumulative size counter.
    pub fn record_stored(&mut self, bytes: u64) {
        self.size += bytes;
    }

    // == Update Entry Count ==
    /// Updates the current entry count.
    pub fn set_entries(&mut self, count: usize) {
        self.entries = count;
    }
}

// == Size Info ==
/// Snapshot of the global byte budget usage.
#[derive(Debug, Clone, Serialize)]
pub struct SizeInfo {
    /// Bytes currently held across all namespaces
    pub current: u64,
    /// Configured byte budget
    pub max: u64,
    /// Utilization as a percentage of the budget
    pub usage_percent: f64,
}

impl SizeInfo {
    /// Creates a new SizeInfo, computing the utilization percentage.
    pub fn new(current: u64, max: u64) -> Self {
        let usage_percent = if max == 0 {
            0.0
        } else {
            (current as f64 / max as f64) * 100.0
        };
        Self {
            current,
            max,
            usage_percent,
        }
    }
}
