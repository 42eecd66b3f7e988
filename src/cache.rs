//! Cache Store
//!
//! Disk-persisted, content-addressed cache with TTL and LRU eviction. One
//! store per stage (extraction, analysis), each under its own namespace
//! directory, one JSON file per fingerprint. Entries self-describe their
//! creation time so TTL evaluation survives process restarts; recency is
//! tracked in memory only and resets on restart.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use excellentcase_core::{Fingerprint, PipelineError, PipelineResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// On-disk envelope for one cached payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry<T> {
    fingerprint: Fingerprint,
    created_at: DateTime<Utc>,
    payload: T,
}

/// Header-only view used when rebuilding the index at startup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHeader {
    fingerprint: Fingerprint,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct EntryMeta {
    created_at: DateTime<Utc>,
    last_access: Instant,
}

/// A TTL + LRU cache persisted under `<dir>/<namespace>/`.
///
/// `get` and `put` for the same fingerprint are serialized by a per-key
/// lock; operations on distinct keys never contend.
pub struct CacheStore<T> {
    dir: PathBuf,
    namespace: &'static str,
    ttl: Duration,
    max_entries: usize,
    index: DashMap<Fingerprint, EntryMeta>,
    locks: DashMap<Fingerprint, Arc<Mutex<()>>>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> CacheStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open (or create) the store, rebuilding the index from the entries
    /// already on disk. Unreadable entries are discarded.
    pub fn open(
        root: impl Into<PathBuf>,
        namespace: &'static str,
        ttl: Duration,
        max_entries: usize,
    ) -> PipelineResult<Self> {
        let dir = root.into().join(namespace);
        std::fs::create_dir_all(&dir)?;

        let store = Self {
            dir,
            namespace,
            ttl,
            max_entries,
            index: DashMap::new(),
            locks: DashMap::new(),
            _payload: PhantomData,
        };
        store.rebuild_index()?;
        tracing::debug!(
            namespace,
            entries = store.index.len(),
            "cache store opened"
        );
        Ok(store)
    }

    fn rebuild_index(&self) -> PipelineResult<()> {
        let now = Instant::now();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(PipelineError::from)
                .and_then(|s| {
                    serde_json::from_str::<StoredHeader>(&s).map_err(PipelineError::from)
                }) {
                Ok(header) => {
                    self.index.insert(
                        header.fingerprint,
                        EntryMeta {
                            created_at: header.created_at,
                            last_access: now,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        namespace = self.namespace,
                        path = %path.display(),
                        error = %e,
                        "discarding unreadable cache entry"
                    );
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
        Ok(())
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    fn key_lock(&self, fingerprint: &Fingerprint) -> Arc<Mutex<()>> {
        self.locks
            .entry(*fingerprint)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // Count 2 = the map's copy plus the caller's clone still in scope.
    fn discard_unused_lock(&self, fingerprint: &Fingerprint) {
        self.locks
            .remove_if(fingerprint, |_, lock| Arc::strong_count(lock) <= 2);
    }

    fn is_expired(&self, meta: &EntryMeta) -> bool {
        let age = Utc::now().signed_duration_since(meta.created_at);
        age.to_std().map(|age| age > self.ttl).unwrap_or(false)
    }

    /// Look up a payload. Expired and corrupted entries are removed and
    /// reported as misses.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<T> {
        let lock = self.key_lock(fingerprint);
        let guard = lock.lock().await;

        let Some(meta) = self.index.get(fingerprint).map(|e| e.value().clone()) else {
            drop(guard);
            self.discard_unused_lock(fingerprint);
            return None;
        };
        if self.is_expired(&meta) {
            tracing::debug!(namespace = self.namespace, key = %fingerprint, "entry expired");
            self.remove_entry(fingerprint);
            return None;
        }

        let path = self.entry_path(fingerprint);
        match std::fs::read_to_string(&path)
            .map_err(PipelineError::from)
            .and_then(|s| serde_json::from_str::<StoredEntry<T>>(&s).map_err(PipelineError::from))
        {
            Ok(stored) => {
                self.index.insert(
                    *fingerprint,
                    EntryMeta {
                        created_at: meta.created_at,
                        last_access: Instant::now(),
                    },
                );
                Some(stored.payload)
            }
            Err(e) => {
                tracing::warn!(
                    namespace = self.namespace,
                    key = %fingerprint,
                    error = %e,
                    "corrupted cache entry discarded"
                );
                self.remove_entry(fingerprint);
                None
            }
        }
    }

    /// Insert or overwrite a payload. Overwriting resets the TTL clock.
    pub async fn put(&self, fingerprint: &Fingerprint, payload: &T) -> PipelineResult<()> {
        let lock = self.key_lock(fingerprint);
        let _guard = lock.lock().await;

        let created_at = Utc::now();
        let stored = StoredEntry {
            fingerprint: *fingerprint,
            created_at,
            payload,
        };
        let json = serde_json::to_string(&stored)?;
        std::fs::write(self.entry_path(fingerprint), json)?;
        self.index.insert(
            *fingerprint,
            EntryMeta {
                created_at,
                last_access: Instant::now(),
            },
        );
        Ok(())
    }

    /// Remove all expired entries, then evict least-recently-used entries
    /// until under the count ceiling. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut removed = 0;

        let expired: Vec<Fingerprint> = self
            .index
            .iter()
            .filter(|e| self.is_expired(e.value()))
            .map(|e| *e.key())
            .collect();
        for fingerprint in expired {
            self.remove_entry(&fingerprint);
            removed += 1;
        }

        let over = self.index.len().saturating_sub(self.max_entries);
        if over > 0 {
            let mut by_recency: Vec<(Fingerprint, Instant)> = self
                .index
                .iter()
                .map(|e| (*e.key(), e.value().last_access))
                .collect();
            by_recency.sort_by_key(|(_, at)| *at);
            for (fingerprint, _) in by_recency.into_iter().take(over) {
                self.remove_entry(&fingerprint);
                removed += 1;
            }
        }

        // Locks are recreated on demand, so any lock nobody holds can go.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        if removed > 0 {
            tracing::debug!(
                namespace = self.namespace,
                removed,
                remaining = self.index.len(),
                "cache sweep"
            );
        }
        removed
    }

    fn remove_entry(&self, fingerprint: &Fingerprint) {
        self.index.remove(fingerprint);
        self.locks.remove(fingerprint);
        let _ = std::fs::remove_file(self.entry_path(fingerprint));
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
