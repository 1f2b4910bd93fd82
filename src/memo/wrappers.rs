//! Memoization Wrappers Module
//!
//! Higher-order wrappers composing a computation with the cache. Each
//! wrapper owns a [`Cache`] handle, a [`CachePolicy`], and the wrapped
//! function; `call()` keeps the function's own calling convention and
//! error type. Only the computation's errors propagate to the caller —
//! the cache itself never fails a call.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::memo::{CachePolicy, KeySpec};

type Predicate<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;

// == Cacheable ==
/// Read-through wrapper: consults the cache before running the
/// computation and stores the result on a miss.
pub struct Cacheable<A, F> {
    cache: Cache,
    policy: CachePolicy,
    key_spec: KeySpec<A>,
    condition: Option<Predicate<A>>,
    func: F,
}

impl<A, F> Cacheable<A, F> {
    /// Wraps `func` with read-through caching.
    ///
    /// # Arguments
    /// * `cache` - Shared cache handle
    /// * `policy` - Namespace and TTL for stored results
    /// * `key_spec` - How call arguments map to cache keys
    /// * `func` - The computation to memoize
    pub fn new(cache: Cache, policy: CachePolicy, key_spec: KeySpec<A>, func: F) -> Self {
        Self {
            cache,
            policy,
            key_spec,
            condition: None,
            func,
        }
    }

    /// Restricts caching to calls whose arguments satisfy the predicate;
    /// everything else runs the computation directly.
    pub fn with_condition(
        mut self,
        condition: impl Fn(&A) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Invokes the wrapped computation through the cache.
    pub async fn call<T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(condition) = &self.condition {
            if !condition(&args) {
                return (self.func)(args).await;
            }
        }

        let key = self.key_spec.derive(&args);
        if let Some(cached) = self.cache.get_typed(&self.policy.namespace, &key).await {
            return Ok(cached);
        }

        let fresh = (self.func)(args).await?;
        self.cache
            .set_typed(&self.policy.namespace, &key, &fresh, self.policy.ttl)
            .await;
        Ok(fresh)
    }
}

// == Cache Evict ==
/// What a [`CacheEvict`] wrapper invalidates after each successful call.
enum EvictTarget<A> {
    /// The whole namespace
    AllEntries,
    /// One derived key
    Key(KeySpec<A>),
}

/// Invalidation wrapper: runs the computation first, then, if it
/// succeeded, clears the target namespace or deletes one derived key.
/// Used after mutations so stale reads cannot survive them.
pub struct CacheEvict<A, F> {
    cache: Cache,
    policy: CachePolicy,
    target: EvictTarget<A>,
    func: F,
}

impl<A, F> CacheEvict<A, F> {
    /// Evicts one derived key after each successful call.
    pub fn key(cache: Cache, policy: CachePolicy, key_spec: KeySpec<A>, func: F) -> Self {
        Self {
            cache,
            policy,
            target: EvictTarget::Key(key_spec),
            func,
        }
    }

    /// Clears the whole namespace after each successful call.
    pub fn all_entries(cache: Cache, policy: CachePolicy, func: F) -> Self {
        Self {
            cache,
            policy,
            target: EvictTarget::AllEntries,
            func,
        }
    }

    /// Invokes the wrapped computation, then invalidates.
    ///
    /// A computation error propagates unchanged and nothing is evicted.
    pub async fn call<T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match &self.target {
            EvictTarget::AllEntries => {
                let result = (self.func)(args).await?;
                self.cache.clear_namespace(&self.policy.namespace).await;
                debug!("Cleared namespace '{}' after mutation", self.policy.namespace);
                Ok(result)
            }
            EvictTarget::Key(key_spec) => {
                let key = key_spec.derive(&args);
                let result = (self.func)(args).await?;
                self.cache.delete(&self.policy.namespace, &key).await;
                debug!("Evicted '{}:{}' after mutation", self.policy.namespace, key);
                Ok(result)
            }
        }
    }
}

// == Cache Put ==
/// Write-through wrapper: always runs the computation, then refreshes
/// the cache with the fresh result. The pattern for "update and
/// re-cache" call sites.
pub struct CachePut<A, F> {
    cache: Cache,
    policy: CachePolicy,
    key_spec: KeySpec<A>,
    func: F,
}

impl<A, F> CachePut<A, F> {
    pub fn new(cache: Cache, policy: CachePolicy, key_spec: KeySpec<A>, func: F) -> Self {
        Self {
            cache,
            policy,
            key_spec,
            func,
        }
    }

    /// Invokes the wrapped computation and re-caches its result.
    pub async fn call<T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.key_spec.derive(&args);
        let fresh = (self.func)(args).await?;
        self.cache
            .set_typed(&self.policy.namespace, &key, &fresh, self.policy.ttl)
            .await;
        Ok(fresh)
    }
}

// == Stats Logged ==
/// Diagnostic passthrough: logs aggregated cache statistics, then
/// delegates to the wrapped computation. Has no effect on caching
/// semantics.
pub struct StatsLogged<F> {
    cache: Cache,
    func: F,
}

impl<F> StatsLogged<F> {
    pub fn new(cache: Cache, func: F) -> Self {
        Self { cache, func }
    }

    /// Logs statistics for every namespace, then invokes the computation.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let all = self.cache.all_stats().await;
        let size = self.cache.size().await;

        info!(
            "Cache statistics: {} namespaces, {} of {} bytes used ({:.1}%)",
            all.len(),
            size.current,
            size.max,
            size.usage_percent
        );
        for (namespace, stats) in &all {
            info!(
                "  {}: {} entries, {} hits, {} misses, hit rate {:.2}",
                namespace,
                stats.entries,
                stats.hits,
                stats.misses,
                stats.hit_rate()
            );
        }

        (self.func)(args).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Builds an async function that counts its invocations and returns
    /// a value derived from its argument.
    fn counting_func(
        calls: &Arc<AtomicUsize>,
    ) -> impl Fn(u32) -> std::pin::Pin<Box<dyn Future<Output = Result<String, String>> + Send>>
    {
        let calls = Arc::clone(calls);
        move |n: u32| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("user_{}", n))
            })
        }
    }

    #[tokio::test]
    async fn test_cacheable_computes_once_per_key() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let cacheable = Cacheable::new(
            cache,
            CachePolicy::new("users"),
            KeySpec::method("load_user"),
            counting_func(&calls),
        );

        assert_eq!(cacheable.call(1).await.unwrap(), "user_1");
        assert_eq!(cacheable.call(1).await.unwrap(), "user_1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cacheable_distinct_arguments_compute_separately() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let cacheable = Cacheable::new(
            cache,
            CachePolicy::new("users"),
            KeySpec::method("load_user"),
            counting_func(&calls),
        );

        assert_eq!(cacheable.call(1).await.unwrap(), "user_1");
        assert_eq!(cacheable.call(2).await.unwrap(), "user_2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cacheable_condition_bypasses_cache() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let cacheable = Cacheable::new(
            cache.clone(),
            CachePolicy::new("users"),
            KeySpec::method("load_user"),
            counting_func(&calls),
        )
        .with_condition(|n: &u32| *n != 0);

        // Argument 0 fails the condition: every call computes, nothing stored
        cacheable.call(0).await.unwrap();
        cacheable.call(0).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats("users").await.entries, 0);
    }

    #[tokio::test]
    async fn test_cacheable_fixed_key_shares_one_slot() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let cacheable = Cacheable::new(
            cache,
            CachePolicy::new("users"),
            KeySpec::fixed("singleton"),
            counting_func(&calls),
        );

        // Different arguments, same fixed key: the first result sticks
        assert_eq!(cacheable.call(1).await.unwrap(), "user_1");
        assert_eq!(cacheable.call(2).await.unwrap(), "user_1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cacheable_respects_policy_ttl() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let cacheable = Cacheable::new(
            cache,
            CachePolicy::new("users").with_ttl(Duration::from_millis(50)),
            KeySpec::method("load_user"),
            counting_func(&calls),
        );

        cacheable.call(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        cacheable.call(1).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cacheable_error_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));

        let func = {
            let calls = Arc::clone(&calls);
            move |n: u32| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err("transient failure".to_string())
                    } else {
                        Ok(format!("user_{}", n))
                    }
                }
            }
        };
        let cacheable = Cacheable::new(
            Cache::default(),
            CachePolicy::new("users"),
            KeySpec::method("load_user"),
            func,
        );

        assert!(cacheable.call(1).await.is_err());
        assert_eq!(cacheable.call(1).await.unwrap(), "user_1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_evict_removes_derived_key() {
        let cache = Cache::default();

        cache
            .set_typed("files", "file:a.txt", &"stale".to_string(), None)
            .await;
        cache
            .set_typed("files", "file:b.txt", &"other".to_string(), None)
            .await;

        let evict = CacheEvict::key(
            cache.clone(),
            CachePolicy::new("files"),
            KeySpec::generator(|path: &String| format!("file:{}", path)),
            |path: String| async move { Ok::<String, String>(format!("wrote {}", path)) },
        );

        evict.call("a.txt".to_string()).await.unwrap();

        assert_eq!(cache.get_typed::<String>("files", "file:a.txt").await, None);
        assert_eq!(
            cache.get_typed::<String>("files", "file:b.txt").await,
            Some("other".to_string())
        );
    }

    #[tokio::test]
    async fn test_cache_evict_all_entries_empties_namespace() {
        let cache = Cache::default();

        cache.set_typed("files", "one", &1, None).await;
        cache.set_typed("files", "two", &2, None).await;
        cache.set_typed("other", "kept", &3, None).await;

        let evict = CacheEvict::all_entries(
            cache.clone(),
            CachePolicy::new("files"),
            |_: ()| async move { Ok::<(), String>(()) },
        );

        evict.call(()).await.unwrap();

        assert_eq!(cache.stats("files").await.entries, 0);
        assert_eq!(cache.stats("other").await.entries, 1);
    }

    #[tokio::test]
    async fn test_cache_evict_skips_eviction_on_error() {
        let cache = Cache::default();

        cache.set_typed("files", "kept", &1, None).await;

        let evict = CacheEvict::all_entries(
            cache.clone(),
            CachePolicy::new("files"),
            |_: ()| async move { Err::<(), String>("mutation failed".to_string()) },
        );

        assert!(evict.call(()).await.is_err());
        assert_eq!(cache.stats("files").await.entries, 1);
    }

    #[tokio::test]
    async fn test_cache_put_always_computes_and_refreshes() {
        let cache = Cache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .set_typed("users", "user:1", &"stale".to_string(), None)
            .await;

        let put = CachePut::new(
            cache.clone(),
            CachePolicy::new("users"),
            KeySpec::generator(|id: &u32| format!("user:{}", id)),
            counting_func(&calls),
        );

        put.call(1).await.unwrap();
        put.call(1).await.unwrap();

        // Write-through never consults the cache on the way in
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache.get_typed::<String>("users", "user:1").await,
            Some("user_1".to_string())
        );
    }

    #[tokio::test]
    async fn test_stats_logged_delegates_unchanged() {
        let cache = Cache::default();
        cache.set_typed("ns", "k", &1, None).await;
        cache.get("ns", "k").await;

        let logged = StatsLogged::new(cache, |n: u32| async move {
            Ok::<u32, String>(n * 2)
        });

        assert_eq!(logged.call(21).await.unwrap(), 42);
    }
}
