//! Cache Store Module
//!
//! Main cache engine combining per-namespace HashMap storage with a global
//! byte budget, cross-namespace LRU eviction, and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    current_timestamp_ms, estimate_size, CacheEntry, CacheStats, LruTracker, SizeInfo,
    DEFAULT_MAX_SIZE,
};

// == Cache Store ==
/// Namespace-partitioned cache storage with a global byte budget.
///
/// Namespaces are independent key spaces: the same key string in two
/// namespaces refers to two entries. The byte budget and the LRU eviction
/// order are global across all of them.
#[derive(Debug)]
pub struct CacheStore {
    /// Per-namespace key-value storage
    namespaces: HashMap<String, HashMap<String, CacheEntry>>,
    /// Global LRU access tracker
    lru: LruTracker,
    /// Per-namespace performance statistics
    stats: HashMap<String, CacheStats>,
    /// Bytes currently held across all namespaces
    current_size: u64,
    /// Global byte budget
    max_size: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given global byte budget.
    ///
    /// # Arguments
    /// * `max_size` - Maximum total bytes the cache may hold
    pub fn new(max_size: u64) -> Self {
        Self {
            namespaces: HashMap::new(),
            lru: LruTracker::new(),
            stats: HashMap::new(),
            current_size: 0,
            max_size,
        }
    }

    // == Get ==
    /// Retrieves a value by key from a namespace.
    ///
    /// Returns the value if found and not expired. Expired entries are
    /// removed on the spot and counted as misses (lazy expiry).
    ///
    /// # Arguments
    /// * `namespace` - The key space to look in
    /// * `key` - The key to retrieve
    pub fn get(&mut self, namespace: &str, key: &str) -> Option<Value> {
        // One pass over the entry: None = missing, Some(None) = expired,
        // Some(Some(value)) = live hit (already touched)
        let lookup = self
            .namespaces
            .get_mut(namespace)
            .and_then(|entries| entries.get_mut(key))
            .map(|entry| {
                if entry.is_expired() {
                    None
                } else {
                    entry.touch();
                    Some(entry.value.clone())
                }
            });

        match lookup {
            None => {
                self.record_miss(namespace);
                None
            }
            Some(None) => {
                // Expired entries are logically absent
                self.remove_entry(namespace, key);
                self.record_miss(namespace);
                None
            }
            Some(Some(value)) => {
                self.lru.touch(namespace, key);
                self.record_hit(namespace);
                Some(value)
            }
        }
    }

    // == Set ==
    /// Stores a value under a key in a namespace, with optional TTL.
    ///
    /// If the key already exists, the old entry's size is released and the
    /// value is overwritten. If storing would push the cache over its byte
    /// budget, eviction runs first. A value too large for the whole budget
    /// is not stored at all (logged, never an error).
    ///
    /// # Arguments
    /// * `namespace` - The key space to store in
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live; `None` or zero means never expires
    pub fn set(&mut self, namespace: &str, key: &str, value: Value, ttl: Option<Duration>) {
        let size = estimate_size(&value);

        // A value bigger than the whole budget can never be stored
        if size > self.max_size {
            warn!(
                "Value for '{}:{}' exceeds the cache budget ({} of {} bytes), not storing",
                namespace, key, size, self.max_size
            );
            return;
        }

        // Make room before committing the new entry
        if self.current_size + size > self.max_size {
            let required = self.current_size + size - self.max_size;
            self.evict(required);
        }

        // Overwrite: release the prior entry's bytes before adding the new ones
        if let Some(previous) = self
            .namespaces
            .get_mut(namespace)
            .and_then(|entries| entries.remove(key))
        {
            self.current_size = self.current_size.saturating_sub(previous.size);
        }

        let entries = self.namespaces.entry(namespace.to_string()).or_default();
        entries.insert(key.to_string(), CacheEntry::new(value, size, ttl));
        let count = entries.len();

        self.current_size += size;
        self.lru.touch(namespace, key);

        let stats = self.stats.entry(namespace.to_string()).or_default();
        stats.record_stored(size);
        stats.set_entries(count);
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if an entry was removed.
    ///
    /// # Arguments
    /// * `namespace` - The key space to delete from
    /// * `key` - The key to delete
    pub fn delete(&mut self, namespace: &str, key: &str) -> bool {
        self.remove_entry(namespace, key).is_some()
    }

    // == Clear Namespace ==
    /// Empties one namespace and releases its bytes.
    ///
    /// Hit/miss/eviction counters for the namespace persist; only the
    /// entries (and their share of the byte budget) are dropped.
    pub fn clear_namespace(&mut self, namespace: &str) {
        if let Some(entries) = self.namespaces.get_mut(namespace) {
            let freed: u64 = entries.values().map(|entry| entry.size).sum();
            entries.clear();
            self.current_size = self.current_size.saturating_sub(freed);
        }
        self.lru.remove_namespace(namespace);
        if let Some(stats) = self.stats.get_mut(namespace) {
            stats.set_entries(0);
        }
    }

    // == Clear All ==
    /// Wipes every namespace and resets the byte count to zero.
    pub fn clear_all(&mut self) {
        self.namespaces.clear();
        self.lru.clear();
        self.current_size = 0;
        for stats in self.stats.values_mut() {
            stats.set_entries(0);
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from every namespace.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let (count, _) = self.remove_expired();
        count
    }

    // == Stats ==
    /// Returns statistics for one namespace.
    ///
    /// A namespace that has never been written to reports zeroed counters.
    pub fn stats(&self, namespace: &str) -> CacheStats {
        let mut stats = self.stats.get(namespace).cloned().unwrap_or_default();
        stats.set_entries(
            self.namespaces
                .get(namespace)
                .map(|entries| entries.len())
                .unwrap_or(0),
        );
        stats
    }

    /// Returns statistics for every namespace the store has seen.
    pub fn all_stats(&self) -> HashMap<String, CacheStats> {
        self.stats
            .keys()
            .chain(self.namespaces.keys())
            .map(|name| (name.clone(), self.stats(name)))
            .collect()
    }

    // == Size ==
    /// Returns the current byte usage against the budget.
    pub fn size(&self) -> SizeInfo {
        SizeInfo::new(self.current_size, self.max_size)
    }

    // == Length ==
    /// Returns the total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(|entries| entries.len()).sum()
    }

    // == Is Empty ==
    /// Returns true if no namespace holds any entry.
    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(|entries| entries.is_empty())
    }

    // == Eviction ==
    /// Frees at least `required` bytes, returning the bytes actually freed.
    ///
    /// Expired entries go first: they are logically absent already, so their
    /// bytes count toward the freed total without touching the eviction
    /// counters. If that is not enough, live entries are removed least
    /// recently used first, globally across namespaces, each one freeing its
    /// actual size, until the cumulative total meets the requirement.
    fn evict(&mut self, required: u64) -> u64 {
        let (_, mut freed) = self.remove_expired();
        let mut evicted = 0usize;

        while freed < required {
            let Some((namespace, key)) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(size) = self.remove_entry(&namespace, &key) {
                freed += size;
                evicted += 1;
                self.stats.entry(namespace).or_default().record_eviction();
            }
        }

        if evicted > 0 {
            debug!("Evicted {} entries to reclaim {} bytes", evicted, freed);
        }
        freed
    }

    // == Internal Helpers ==
    /// Removes every expired entry, returning (count, bytes) removed.
    fn remove_expired(&mut self) -> (usize, u64) {
        let now = current_timestamp_ms();
        let expired: Vec<(String, String)> = self
            .namespaces
            .iter()
            .flat_map(|(namespace, entries)| {
                entries
                    .iter()
                    .filter(|(_, entry)| entry.is_expired_at(now))
                    .map(move |(key, _)| (namespace.clone(), key.clone()))
            })
            .collect();

        let count = expired.len();
        let mut bytes = 0u64;
        for (namespace, key) in expired {
            if let Some(size) = self.remove_entry(&namespace, &key) {
                bytes += size;
            }
        }
        (count, bytes)
    }

    /// Removes one entry, keeping the byte count, the LRU tracker, and the
    /// namespace entry count in sync. Returns the freed bytes.
    fn remove_entry(&mut self, namespace: &str, key: &str) -> Option<u64> {
        let entries = self.namespaces.get_mut(namespace)?;
        let entry = entries.remove(key)?;
        let remaining = entries.len();

        self.current_size = self.current_size.saturating_sub(entry.size);
        self.lru.remove(namespace, key);
        self.stats
            .entry(namespace.to_string())
            .or_default()
            .set_entries(remaining);
        Some(entry.size)
    }

    fn record_hit(&mut self, namespace: &str) {
        self.stats
            .entry(namespace.to_string())
            .or_default()
            .record_hit();
    }

    fn record_miss(&mut self, namespace: &str) {
        self.stats
            .entry(namespace.to_string())
            .or_default()
            .record_miss();
    }

    /// Recomputes the byte total from scratch; test support for checking the
    /// incremental accounting never drifts.
    #[cfg(test)]
    pub(crate) fn recompute_size(&self) -> u64 {
        self.namespaces
            .values()
            .flat_map(|entries| entries.values())
            .map(|entry| entry.size)
            .sum()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}
