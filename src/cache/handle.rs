//! Cache Handle Module
//!
//! Cloneable handle over the cache store. One `Cache` is constructed at
//! startup and handed to every component that caches; clones share the
//! same underlying store. All consumers go through this handle rather
//! than reaching for any global state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::cache::{CacheStats, CacheStore, SizeInfo, DEFAULT_MAX_SIZE};
use crate::config::Config;

// == Cache Handle ==
/// Shared, async-friendly front for [`CacheStore`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<RwLock<CacheStore>>,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache with the given global byte budget.
    pub fn new(max_size: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_size))),
        }
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_cache_size)
    }

    // == Core Operations ==
    /// Retrieves a raw value by key from a namespace.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.store.write().await.get(namespace, key)
    }

    /// Stores a raw value under a key in a namespace.
    ///
    /// # Arguments
    /// * `namespace` - The key space to store in
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live; `None` or zero means never expires
    pub async fn set(&self, namespace: &str, key: &str, value: Value, ttl: Option<Duration>) {
        self.store.write().await.set(namespace, key, value, ttl);
    }

    /// Removes an entry, returning true if one was removed.
    pub async fn delete(&self, namespace: &str, key: &str) -> bool {
        self.store.write().await.delete(namespace, key)
    }

    /// Empties one namespace.
    pub async fn clear_namespace(&self, namespace: &str) {
        self.store.write().await.clear_namespace(namespace);
    }

    /// Wipes every namespace.
    pub async fn clear_all(&self) {
        self.store.write().await.clear_all();
    }

    /// Sweeps expired entries, returning how many were removed.
    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup()
    }

    // == Typed Operations ==
    /// Retrieves a value and decodes it into `T`.
    ///
    /// A cached value that no longer decodes into the requested type is
    /// treated as absent.
    pub async fn get_typed<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let value = self.get(namespace, key).await?;
        serde_json::from_value(value).ok()
    }

    /// Encodes a value and stores it.
    ///
    /// A value that fails to serialize is logged and not stored; the
    /// caller still holds the original.
    pub async fn set_typed<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) {
        match serde_json::to_value(value) {
            Ok(encoded) => self.set(namespace, key, encoded, ttl).await,
            Err(error) => {
                warn!(
                    "Failed to serialize value for '{}:{}', not storing: {}",
                    namespace, key, error
                );
            }
        }
    }

    // == Get Or Set ==
    /// Returns the cached value for `key`, or computes and stores it.
    ///
    /// The store lock is not held while the factory runs, so two
    /// concurrent callers that both miss will both run their factories
    /// and both write the result; the last write wins. Callers needing
    /// single-flight semantics must deduplicate upstream.
    ///
    /// A factory error propagates unchanged and nothing is stored.
    ///
    /// # Arguments
    /// * `namespace` - The key space to consult
    /// * `key` - The key to look up
    /// * `ttl` - Time to live applied when the factory result is stored
    /// * `factory` - Computation producing the value on a miss
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get_typed(namespace, key).await {
            return Ok(cached);
        }

        let fresh = factory().await?;
        self.set_typed(namespace, key, &fresh, ttl).await;
        Ok(fresh)
    }

    // == Introspection ==
    /// Returns statistics for one namespace.
    pub async fn stats(&self, namespace: &str) -> CacheStats {
        self.store.read().await.stats(namespace)
    }

    /// Returns statistics for every namespace.
    pub async fn all_stats(&self) -> HashMap<String, CacheStats> {
        self.store.read().await.all_stats()
    }

    /// Returns current byte usage against the budget.
    pub async fn size(&self) -> SizeInfo {
        self.store.read().await.size()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}
