//! Cache Store Integration Tests
//!
//! TTL expiry, LRU eviction under the count ceiling, persistence across
//! reopen, and self-healing on corrupted entries, exercised through the
//! public store API with real files.

use std::time::Duration;

use tempfile::TempDir;

use excellentcase::cache::CacheStore;
use excellentcase::core::Fingerprint;

fn fp(label: &str) -> Fingerprint {
    Fingerprint::of_text(label).unwrap()
}

#[tokio::test]
async fn test_hit_before_ttl_miss_after() {
    let dir = TempDir::new().unwrap();
    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "analysis", Duration::from_millis(100), 16).unwrap();

    store.put(&fp("doc"), &"payload".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(store.get(&fp("doc")).await.is_some(), "hit within TTL");

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(store.get(&fp("doc")).await.is_none(), "miss past TTL");
    assert_eq!(store.len(), 0, "expired entry evicted lazily");
}

#[tokio::test]
async fn test_overwrite_resets_ttl_clock() {
    let dir = TempDir::new().unwrap();
    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "analysis", Duration::from_millis(100), 16).unwrap();

    store.put(&fp("doc"), &"v1".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(70)).await;
    store.put(&fp("doc"), &"v2".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(70)).await;

    // 140ms since the first write, 70ms since the overwrite.
    assert_eq!(store.get(&fp("doc")).await.as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store: CacheStore<String> =
            CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 16).unwrap();
        store.put(&fp("a"), &"alpha".to_string()).await.unwrap();
        store.put(&fp("b"), &"beta".to_string()).await.unwrap();
    }

    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 16).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&fp("a")).await.as_deref(), Some("alpha"));
    assert_eq!(store.get(&fp("b")).await.as_deref(), Some("beta"));
}

#[tokio::test]
async fn test_stale_entries_expire_across_restart() {
    let dir = TempDir::new().unwrap();
    {
        let store: CacheStore<String> =
            CacheStore::open(dir.path(), "extraction", Duration::from_millis(50), 16).unwrap();
        store.put(&fp("a"), &"alpha".to_string()).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Creation times are read back from the entries themselves.
    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "extraction", Duration::from_millis(50), 16).unwrap();
    assert!(store.get(&fp("a")).await.is_none());
}

#[tokio::test]
async fn test_sweep_evicts_lru_over_ceiling() {
    let dir = TempDir::new().unwrap();
    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 2).unwrap();

    store.put(&fp("a"), &"a".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.put(&fp("b"), &"b".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.put(&fp("c"), &"c".to_string()).await.unwrap();

    // Refresh "a" so "b" is the least recently used.
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.get(&fp("a")).await.unwrap();

    assert_eq!(store.sweep(), 1);
    assert!(store.get(&fp("a")).await.is_some());
    assert!(store.get(&fp("b")).await.is_none());
    assert!(store.get(&fp("c")).await.is_some());
}

#[tokio::test]
async fn test_corrupted_entry_treated_as_miss() {
    let dir = TempDir::new().unwrap();
    let store: CacheStore<String> =
        CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 16).unwrap();
    store.put(&fp("doc"), &"good".to_string()).await.unwrap();

    let path = dir
        .path()
        .join("extraction")
        .join(format!("{}.json", fp("doc")));
    std::fs::write(&path, b"\0\0 not json").unwrap();

    assert!(store.get(&fp("doc")).await.is_none());
    assert!(!path.exists(), "corrupted file removed");

    // The key is usable again after the miss.
    store.put(&fp("doc"), &"fresh".to_string()).await.unwrap();
    assert_eq!(store.get(&fp("doc")).await.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_namespaces_are_independent() {
    let dir = TempDir::new().unwrap();
    let extraction: CacheStore<String> =
        CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 16).unwrap();
    let analysis: CacheStore<String> =
        CacheStore::open(dir.path(), "analysis", Duration::from_secs(3600), 16).unwrap();

    extraction.put(&fp("doc"), &"text".to_string()).await.unwrap();
    assert!(analysis.get(&fp("doc")).await.is_none());
    assert_eq!(analysis.len(), 0);
}
