//! Behavioral tests for `TtlStore` across threads, runtimes and timing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::task::JoinSet;

use ttlcache_store::{Cache, CacheError, TtlStore};

/// Polls until `cond` holds, failing after `timeout` of real time.
async fn eventually(timeout: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + timeout;
    while !cond() {
        assert!(std::time::Instant::now() < deadline, "condition not met within {timeout:?}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_ttl_scenario() {
    let store = TtlStore::new(Duration::from_millis(10)).unwrap();
    store.set("key".to_string(), "value".to_string());

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(store.get("key"), None);
}

#[tokio::test]
async fn test_expire_scenario() {
    let store = TtlStore::new(Duration::from_secs(60)).unwrap();
    store.set("key".to_string(), "value".to_string());
    store.expire("key");

    assert_eq!(store.get("key"), None);
}

#[tokio::test(start_paused = true)]
async fn test_many_keys_expire_naturally() {
    let store = TtlStore::new(Duration::from_millis(50)).unwrap();
    for i in 0..500u32 {
        store.set(i, i * 2);
    }
    assert_eq!(store.len(), 500);
    assert_eq!(store.active_watchers(), 500);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!((0..500u32).all(|i| store.get(&i).is_none()));
    let stats = store.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.natural_expirations, 500);
    assert_eq!(stats.explicit_expirations, 0);
    assert_eq!(stats.active_watchers, 0);
}

#[tokio::test(start_paused = true)]
async fn test_staggered_expiration() {
    let store = TtlStore::new(Duration::from_millis(30)).unwrap();
    store.set("early", 1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.set("late", 2);

    tokio::time::sleep(Duration::from_millis(15)).await;
    assert_eq!(store.get("early"), None);
    assert_eq!(store.get("late"), Some(2));
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_get_expire() {
    let store = Arc::new(TtlStore::new(Duration::from_secs(60)).unwrap());
    let mut tasks = JoinSet::new();

    for worker in 0..8u64 {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            for i in 0..2_000u64 {
                let key = (worker + i) % 16;
                match i % 4 {
                    0 | 1 => store.set(key, i),
                    2 => {
                        let _ = store.get(&key);
                    }
                    _ => store.expire(&key),
                }
                if i % 256 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let visible = (0..16u64).filter(|k| store.contains_key(k)).count();
    assert_eq!(visible, store.len());

    let stats = store.stats();
    assert_eq!(stats.inserts, stats.total_expirations() + stats.entries as u64);

    store.expire_all();
    eventually(Duration::from_secs(5), || store.is_empty() && store.active_watchers() == 0).await;
    let stats = store.stats();
    assert_eq!(stats.inserts, stats.total_expirations());
}

#[tokio::test(start_paused = true)]
async fn test_len_matches_visible_keys_after_deadline() {
    let store = TtlStore::new(Duration::from_millis(10)).unwrap();
    store.set(1u32, "short");
    tokio::time::advance(Duration::from_millis(5)).await;
    store.set(2u32, "long");

    tokio::time::advance(Duration::from_millis(8)).await;

    let visible = (0..4u32).filter(|k| store.get(k).is_some()).count();
    assert_eq!(visible, 1);
    assert_eq!(store.len(), visible);
    assert_eq!(store.stats().entries, visible);
    assert!(!store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_expire_races_timer() {
    let store = TtlStore::new(Duration::from_millis(1)).unwrap();

    for round in 0..200u32 {
        store.set("key", round);
        if round % 2 == 0 {
            std::thread::sleep(Duration::from_micros(900));
        }
        store.expire("key");
        assert_eq!(store.get("key"), None);
    }

    eventually(Duration::from_secs(5), || store.active_watchers() == 0).await;
    let stats = store.stats();
    assert_eq!(stats.inserts, 200);
    assert_eq!(stats.total_expirations(), 200);
}

#[tokio::test]
async fn test_expire_all_terminates_watchers() {
    let store = TtlStore::new(Duration::from_secs(60)).unwrap();
    for i in 0..100 {
        store.set(format!("user:{i}"), i);
    }

    store.expire_all();
    assert!(store.is_empty());
    assert!((0..100).all(|i| store.get(&format!("user:{i}")).is_none()));

    eventually(Duration::from_secs(5), || store.active_watchers() == 0).await;

    // The store is still usable afterwards.
    store.set("user:0".to_string(), 42);
    assert_eq!(store.get("user:0"), Some(42));
}

#[tokio::test]
async fn test_shared_behind_cache_trait() {
    let store: TtlStore<String, Vec<u8>> = TtlStore::new(Duration::from_secs(60)).unwrap();
    let cache: Arc<dyn Cache<String, Vec<u8>>> = Arc::new(store.clone());

    let writer = Arc::clone(&cache);
    tokio::spawn(async move {
        writer.set("blob".to_string(), vec![1, 2, 3]);
    })
    .await
    .unwrap();

    assert_eq!(cache.get(&"blob".to_string()), Some(vec![1, 2, 3]));
    assert_eq!(store.stats().inserts, 1);
}

#[test]
fn test_construction_errors() {
    assert!(matches!(
        TtlStore::<String, String>::new(Duration::from_secs(1)),
        Err(CacheError::NoRuntime)
    ));

    let rt = current_thread_runtime();
    assert!(matches!(
        TtlStore::<String, String>::with_handle(Duration::ZERO, rt.handle().clone()),
        Err(CacheError::InvalidTtl)
    ));
}

#[test]
fn test_usable_from_plain_threads() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let store = TtlStore::with_handle(Duration::from_millis(20), rt.handle().clone()).unwrap();

    let writer = store.clone();
    std::thread::spawn(move || writer.set("key".to_string(), 1))
        .join()
        .unwrap();
    assert_eq!(store.get("key"), Some(1));

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(store.get("key"), None);
    assert!(store.is_empty());
}

proptest! {
    #[test]
    fn prop_set_then_get(key in ".*", value in any::<Vec<u8>>()) {
        let rt = current_thread_runtime();
        let store = TtlStore::with_handle(Duration::from_secs(60), rt.handle().clone()).unwrap();

        store.set(key.clone(), value.clone());
        prop_assert_eq!(store.get(key.as_str()), Some(value));
        prop_assert_eq!(store.get(format!("{key}-absent").as_str()), None);
    }

    #[test]
    fn prop_matches_map_model(ops in proptest::collection::vec((0u8..8, any::<u32>(), any::<bool>()), 0..64)) {
        let rt = current_thread_runtime();
        let store = TtlStore::with_handle(Duration::from_secs(60), rt.handle().clone()).unwrap();
        let mut model = HashMap::new();

        for (key, value, is_set) in ops {
            if is_set {
                store.set(key, value);
                model.insert(key, value);
            } else {
                store.expire(&key);
                model.remove(&key);
            }
        }

        prop_assert_eq!(store.len(), model.len());
        for key in 0u8..8 {
            prop_assert_eq!(store.get(&key), model.get(&key).copied());
        }
        prop_assert!(store.active_watchers() >= model.len());
    }
}
