//! LRU Tracker Module
//!
//! Tracks access order across every namespace for global LRU eviction.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order of namespace-qualified keys for eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Eviction order is global: a stale entry in one namespace is evicted
/// before a fresh entry in another.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Order of (namespace, key) pairs by access time
    order: VecDeque<(String, String)>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// If the key exists, removes it first then adds to front.
    /// If the key is new, just adds to front.
    pub fn touch(&mut self, namespace: &str, key: &str) {
        // Remove existing occurrence
        self.remove(namespace, key);
        // Add to front (most recent)
        self.order.push_front((namespace.to_string(), key.to_string()));
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, namespace: &str, key: &str) {
        self.order.retain(|(ns, k)| ns != namespace || k != key);
    }

    // == Remove Namespace ==
    /// Removes every key belonging to a namespace.
    pub fn remove_namespace(&mut self, namespace: &str) {
        self.order.retain(|(ns, _)| ns != namespace);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<(String, String)> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&(String, String)> {
        self.order.back()
    }

    // == Clear ==
    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[allow(dead_code)]
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.order.iter().any(|(ns, k)| ns == namespace && k == key)
    }
}
