//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the invariants the cache engine promises:
//! exact byte accounting, the global size bound, namespace isolation,
//! LRU eviction order, and honest statistics.

use proptest::prelude::*;
use std::collections::HashMap;
use std::thread::sleep;
use std::time::Duration;

use serde_json::{json, Value};

use crate::cache::{estimate_size, Cache, CacheStore};
use crate::keys::generate_key;

// == Test Configuration ==
const TEST_MAX_SIZE: u64 = 512;

// == Strategies ==
/// Generates valid cache keys (short printable identifiers)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,14}"
}

/// Generates JSON values covering every size-estimation branch: strings,
/// integers, booleans, byte-shaped arrays, and general arrays
fn json_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,32}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        prop::collection::vec(0u64..=255, 1..16).prop_map(|bytes| json!(bytes)),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(|nums| json!(nums)),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set {
        namespace: String,
        key: String,
        value: Value,
    },
    Get {
        namespace: String,
        key: String,
    },
    Delete {
        namespace: String,
        key: String,
    },
}

/// Draws operations from a deliberately small key/namespace space so
/// overwrites, hits, and deletes of live entries happen often
fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let namespace = "[ab]";
    let key = "k[0-5]";
    prop_oneof![
        3 => (namespace, key, json_value_strategy()).prop_map(|(namespace, key, value)| {
            CacheOp::Set { namespace, key, value }
        }),
        2 => (namespace, key).prop_map(|(namespace, key)| CacheOp::Get { namespace, key }),
        1 => (namespace, key).prop_map(|(namespace, key)| CacheOp::Delete { namespace, key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a pair and immediately retrieving it returns the exact
    // value that was stored.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in json_value_strategy()) {
        let mut store = CacheStore::default();

        store.set("ns", &key, value.clone(), None);

        prop_assert_eq!(store.get("ns", &key), Some(value), "Round-trip value mismatch");
    }

    // Storing V1 then V2 under the same key returns V2, with exactly one
    // entry remaining.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in json_value_strategy(),
        value2 in json_value_strategy(),
    ) {
        let mut store = CacheStore::default();

        store.set("ns", &key, value1, None);
        store.set("ns", &key, value2.clone(), None);

        prop_assert_eq!(store.get("ns", &key), Some(value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(), 1, "Should have exactly one entry after overwrite");
    }

    // A deleted key is absent and its bytes are released.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in json_value_strategy()) {
        let mut store = CacheStore::default();

        store.set("ns", &key, value, None);

        prop_assert!(store.delete("ns", &key), "Delete should report removal");
        prop_assert_eq!(store.get("ns", &key), None, "Key should not exist after delete");
        prop_assert_eq!(store.size().current, 0, "Bytes should be released after delete");
    }

    // A key stored in one namespace is invisible from every other.
    #[test]
    fn prop_namespace_isolation(key in valid_key_strategy(), value in json_value_strategy()) {
        let mut store = CacheStore::default();

        store.set("a", &key, value.clone(), None);

        prop_assert_eq!(store.get("b", &key), None, "Other namespace should miss");
        prop_assert_eq!(store.get("a", &key), Some(value), "Owning namespace should hit");
    }

    // After any operation sequence the incremental byte count matches a
    // from-scratch recomputation and never exceeds the budget.
    #[test]
    fn prop_size_accounting_never_drifts(
        ops in prop::collection::vec(cache_op_strategy(), 1..40)
    ) {
        let mut store = CacheStore::new(TEST_MAX_SIZE);

        for op in ops {
            match op {
                CacheOp::Set { namespace, key, value } => {
                    store.set(&namespace, &key, value, None);
                }
                CacheOp::Get { namespace, key } => {
                    store.get(&namespace, &key);
                }
                CacheOp::Delete { namespace, key } => {
                    store.delete(&namespace, &key);
                }
            }

            prop_assert!(
                store.size().current <= TEST_MAX_SIZE,
                "Usage {} exceeds budget {}",
                store.size().current,
                TEST_MAX_SIZE
            );
            prop_assert_eq!(
                store.size().current,
                store.recompute_size(),
                "Incremental accounting drifted from true sum"
            );
        }
    }

    // The store agrees with a plain map model on every read, and its
    // hit/miss counters match the model's bookkeeping exactly.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let mut store = CacheStore::default();
        let mut model: HashMap<(String, String), Value> = HashMap::new();
        let mut expected_hits: HashMap<String, u64> = HashMap::new();
        let mut expected_misses: HashMap<String, u64> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { namespace, key, value } => {
                    store.set(&namespace, &key, value.clone(), None);
                    model.insert((namespace, key), value);
                }
                CacheOp::Get { namespace, key } => {
                    let expected = model.get(&(namespace.clone(), key.clone())).cloned();
                    if expected.is_some() {
                        *expected_hits.entry(namespace.clone()).or_default() += 1;
                    } else {
                        *expected_misses.entry(namespace.clone()).or_default() += 1;
                    }
                    prop_assert_eq!(store.get(&namespace, &key), expected, "Read disagrees with model");
                }
                CacheOp::Delete { namespace, key } => {
                    let expected = model.remove(&(namespace.clone(), key.clone())).is_some();
                    prop_assert_eq!(store.delete(&namespace, &key), expected, "Delete disagrees with model");
                }
            }
        }

        prop_assert_eq!(store.len(), model.len(), "Total entries mismatch");
        for namespace in ["a", "b"] {
            let stats = store.stats(namespace);
            prop_assert_eq!(
                stats.hits,
                expected_hits.get(namespace).copied().unwrap_or(0),
                "Hits mismatch"
            );
            prop_assert_eq!(
                stats.misses,
                expected_misses.get(namespace).copied().unwrap_or(0),
                "Misses mismatch"
            );
            let live = model.keys().filter(|(ns, _)| ns == namespace).count();
            prop_assert_eq!(stats.entries, live, "Entries mismatch");
        }
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling past the budget evicts the oldest inserts first, so the
    // survivors are always a contiguous run of the newest keys.
    #[test]
    fn prop_lru_eviction_order(count in 4usize..10) {
        let mut store = CacheStore::new(100);
        let keys: Vec<String> = (0..count).map(|i| format!("key{}", i)).collect();

        // 20 bytes apiece, so five fit exactly
        for key in &keys {
            store.set("ns", key, json!("0123456789"), None);
        }

        let survivors: Vec<bool> = keys
            .iter()
            .map(|key| store.get("ns", key).is_some())
            .collect();
        let first_live = survivors.iter().position(|live| *live).unwrap_or(count);

        prop_assert!(
            survivors[first_live..].iter().all(|live| *live),
            "Evicted keys should be the oldest contiguous run"
        );
        prop_assert!(store.size().current <= 100, "Usage exceeds budget after eviction");
    }

    // A GET on the next eviction candidate makes it most recently used,
    // shifting eviction onto the following key.
    #[test]
    fn prop_lru_access_tracking(count in 3usize..8) {
        let budget = (count * 20) as u64;
        let mut store = CacheStore::new(budget);
        let keys: Vec<String> = (0..count).map(|i| format!("key{}", i)).collect();

        // Fill exactly to capacity with 20-byte entries
        for key in &keys {
            store.set("ns", key, json!("0123456789"), None);
        }

        // Touch the would-be eviction candidate
        store.get("ns", &keys[0]);

        // The next insert must evict the second key instead
        store.set("ns", "fresh", json!("0123456789"), None);

        prop_assert!(
            store.get("ns", &keys[0]).is_some(),
            "Accessed key '{}' should not be evicted after being touched",
            keys[0]
        );
        prop_assert!(
            store.get("ns", &keys[1]).is_none(),
            "Key '{}' should have been evicted as the oldest untouched entry",
            keys[1]
        );
        prop_assert!(store.get("ns", "fresh").is_some(), "New key should exist");
    }
}

// == Property Tests for Key Generation and Size Estimation ==

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Structurally equal argument lists always hash to the same key, and
    // the key is a fixed-length hex digest.
    #[test]
    fn prop_generate_key_is_stable(parts in prop::collection::vec(json_value_strategy(), 0..5)) {
        let first = generate_key(&parts);
        let second = generate_key(&parts);

        prop_assert_eq!(&first, &second, "Equal inputs should produce equal keys");
        prop_assert_eq!(first.len(), 32, "Key should be a fixed-length digest");
        prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()), "Key should be hex");
    }

    // String footprints follow the two-bytes-per-character rule.
    #[test]
    fn prop_string_size_is_twice_char_count(s in "[a-zA-Z0-9 ]{0,64}") {
        let expected = (s.chars().count() * 2) as u64;
        prop_assert_eq!(estimate_size(&Value::from(s)), expected);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // An entry is served before its TTL elapses and absent after, with
    // the namespace entry count dropping accordingly.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in json_value_strategy(),
    ) {
        let mut store = CacheStore::default();

        store.set("ns", &key, value.clone(), Some(Duration::from_millis(50)));
        prop_assert_eq!(store.get("ns", &key), Some(value), "Entry should exist before TTL expires");

        sleep(Duration::from_millis(80));

        prop_assert_eq!(store.get("ns", &key), None, "Entry should be absent after TTL expires");
        prop_assert_eq!(store.stats("ns").entries, 0, "Entry count should drop on expiry");
    }
}

// == Property Tests for Concurrent Operation Correctness ==
// Exercises the shared handle via Arc-cloned tasks.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Concurrent operations through the shared handle must leave the
    // store consistent: usage within budget, statistics well-formed.
    #[test]
    fn prop_concurrent_operation_consistency(
        operations in prop::collection::vec(cache_op_strategy(), 10..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let cache = Cache::new(4096);
            let mut handles = vec![];

            for op in operations {
                let cache = cache.clone();
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Set { namespace, key, value } => {
                            cache.set(&namespace, &key, value, None).await;
                        }
                        CacheOp::Get { namespace, key } => {
                            cache.get(&namespace, &key).await;
                        }
                        CacheOp::Delete { namespace, key } => {
                            cache.delete(&namespace, &key).await;
                        }
                    }
                }));
            }

            for handle in handles {
                handle.await.expect("Task should not panic");
            }

            let size = cache.size().await;
            prop_assert!(
                size.current <= 4096,
                "Usage {} exceeds budget after concurrent operations",
                size.current
            );

            for namespace in ["a", "b"] {
                let hit_rate = cache.stats(namespace).await.hit_rate();
                prop_assert!(
                    (0.0..=1.0).contains(&hit_rate),
                    "Hit rate should be between 0 and 1, got {}",
                    hit_rate
                );
            }

            Ok(())
        })?;
    }

    // Concurrent get_or_set callers for one key all observe some
    // successfully computed value; the stampede may run several
    // factories, but every caller gets a complete result.
    #[test]
    fn prop_concurrent_get_or_set_completes(worker_count in 2usize..6) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let cache = Cache::default();
            let mut handles = vec![];

            for worker in 0..worker_count {
                let cache = cache.clone();
                handles.push(tokio::spawn(async move {
                    cache
                        .get_or_set("ns", "shared", None, move || async move {
                            Ok::<String, std::io::Error>(format!("result_{}", worker))
                        })
                        .await
                }));
            }

            let mut results = vec![];
            for handle in handles {
                let value = handle.await.expect("Task should not panic").unwrap();
                results.push(value);
            }

            for value in &results {
                prop_assert!(
                    value.starts_with("result_"),
                    "Every caller should observe a computed value, got {}",
                    value
                );
            }

            Ok(())
        })?;
    }
}
