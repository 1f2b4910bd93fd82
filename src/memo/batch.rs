//! Batch Memoization Module
//!
//! Read-through wrapper for list-shaped computations: functions that
//! take a list of items and return one result per item, in order. Only
//! the uncached items reach the wrapped function, in bounded chunks,
//! and the output list always matches the input's length and order.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::Cache;
use crate::memo::CachePolicy;

/// Default number of uncached items handed to the computation per call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

type KeyExtractor<I> = Box<dyn Fn(&I) -> String + Send + Sync>;

// == Cacheable Batch ==
/// Per-item read-through caching over a batch computation.
pub struct CacheableBatch<I, F> {
    cache: Cache,
    policy: CachePolicy,
    key_extractor: KeyExtractor<I>,
    batch_size: usize,
    func: F,
}

impl<I, F> CacheableBatch<I, F> {
    /// Wraps a batch function with per-item caching.
    ///
    /// # Arguments
    /// * `cache` - Shared cache handle
    /// * `policy` - Namespace and TTL for stored per-item results
    /// * `key_extractor` - Derives each item's cache key
    /// * `func` - Computation mapping a list of items to a list of
    ///   results of the same length and order
    pub fn new(
        cache: Cache,
        policy: CachePolicy,
        key_extractor: impl Fn(&I) -> String + Send + Sync + 'static,
        func: F,
    ) -> Self {
        Self {
            cache,
            policy,
            key_extractor: Box::new(key_extractor),
            batch_size: DEFAULT_BATCH_SIZE,
            func,
        }
    }

    /// Overrides the per-call chunk size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Runs the computation over the uncached subset of `items`.
    ///
    /// Cached items fill their slots directly; the rest are computed in
    /// chunks of at most the configured batch size, cached individually,
    /// and written back into their original positions. The returned list
    /// has the same length and order as the input regardless of the
    /// hit/miss mix.
    ///
    /// # Panics
    /// Panics if the wrapped computation returns a list whose length
    /// differs from the chunk it was given.
    pub async fn call<T, E, Fut>(&self, items: Vec<I>) -> Result<Vec<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(Vec<I>) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let total = items.len();
        let mut slots: Vec<Option<T>> = Vec::with_capacity(total);
        let mut pending: Vec<(usize, I, String)> = Vec::new();

        // Partition into cached results and items still to compute
        for (index, item) in items.into_iter().enumerate() {
            let key = (self.key_extractor)(&item);
            match self.cache.get_typed(&self.policy.namespace, &key).await {
                Some(cached) => slots.push(Some(cached)),
                None => {
                    slots.push(None);
                    pending.push((index, item, key));
                }
            }
        }

        if !pending.is_empty() {
            debug!(
                "Batch of {}: {} cached, {} to compute",
                total,
                total - pending.len(),
                pending.len()
            );
        }

        // Compute the misses in bounded chunks, filling slots by index
        let mut remaining = pending.into_iter();
        loop {
            let chunk: Vec<(usize, I, String)> =
                remaining.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }

            let mut indices = Vec::with_capacity(chunk.len());
            let mut keys = Vec::with_capacity(chunk.len());
            let mut chunk_items = Vec::with_capacity(chunk.len());
            for (index, item, key) in chunk {
                indices.push(index);
                keys.push(key);
                chunk_items.push(item);
            }

            let sent = chunk_items.len();
            let results = (self.func)(chunk_items).await?;
            assert_eq!(
                results.len(),
                sent,
                "batch computation must return one result per item"
            );

            for ((index, key), result) in indices.into_iter().zip(keys).zip(results) {
                self.cache
                    .set_typed(&self.policy.namespace, &key, &result, self.policy.ttl)
                    .await;
                slots[index] = Some(result);
            }
        }

        // Every slot was filled above: cached up front or computed just now
        let results = slots
            .into_iter()
            .map(|slot| slot.expect("batch slot left unfilled"))
            .collect();
        Ok(results)
    }
}
