//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Estimated byte footprint of the value
    pub size: u64,
    /// Number of successful retrievals of this entry
    pub hits: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// A `ttl` of `None` or zero means the entry never expires.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `size` - Estimated byte footprint of the value
    /// * `ttl` - Optional time to live
    pub fn new(value: Value, size: u64, ttl: Option<Duration>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| now + ttl.as_millis() as u64);

        Self {
            value,
            size,
            hits: 0,
            created_at: now,
            last_accessed: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: An entry is considered expired when the current time
    /// is greater than or equal to the expiration time. This ensures that once
    /// the TTL duration has fully elapsed, the entry is immediately expired.
    ///
    /// # Returns
    /// - `true` if the entry has a TTL and the current time >= expiration time
    /// - `false` if the entry has no TTL (never expires) or TTL hasn't elapsed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against a caller-supplied timestamp.
    ///
    /// Sweep loops fetch the clock once and reuse it across every entry.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful retrieval: bumps the hit counter and refreshes
    /// the last-access timestamp.
    pub fn touch(&mut self) {
        self.hits += 1;
        self.last_accessed = current_timestamp_ms();
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// This method is useful for debugging and statistics purposes.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            if expires > now {
                expires - now
            } else {
                0
            }
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
