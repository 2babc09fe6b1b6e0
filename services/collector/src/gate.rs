//! Source cache gate
//!
//! Reads a stored payload when told to, otherwise fetches and overwrites the
//! stored copy. Fetch and store failures degrade to empty text; nothing is
//! propagated to the caller.

use crate::error::{FetchError, Result};
use crate::source::RemoteSource;
use crate::store::{CacheStore, LAST_STORED_KEY};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether stored payloads are still current.
///
/// True only when both timestamps are known and the local copy is at least
/// as new as the remote revision.
pub fn should_load_from_cache(remote_millis: Option<i64>, local_millis: Option<i64>) -> bool {
    match (remote_millis, local_millis) {
        (Some(remote), Some(local)) => local >= remote,
        _ => false,
    }
}

#[derive(Clone)]
pub struct SourceCache {
    store: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteSource>,
}

impl SourceCache {
    pub fn new(store: Arc<dyn CacheStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self { store, remote }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteSource> {
        &self.remote
    }

    /// Raw text for `key`, from the store or from `url`
    pub async fn load(&self, key: &str, url: &str, load_from_cache: bool) -> String {
        if load_from_cache {
            return match self.read_entry(key).await {
                Ok(Some(text)) => {
                    debug!("cache hit for {}", key);
                    text
                }
                Ok(None) => {
                    info!("cache miss for {}", key);
                    String::new()
                }
                Err(e) => {
                    warn!("cache read failed for {}: {}", key, e);
                    String::new()
                }
            };
        }

        let text = self.fetch_live(url).await;
        if let Err(e) = self.write_entry(key, text.clone()).await {
            warn!("cache write failed for {}: {}", key, e);
        }
        text
    }

    /// Fetch without touching the store
    pub async fn fetch_live(&self, url: &str) -> String {
        match self.remote.fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!("fetch failed for {}: {}", url, e);
                String::new()
            }
        }
    }

    /// Epoch milliseconds of the last successful report run
    pub async fn last_stored(&self) -> Option<i64> {
        match self.read_entry(LAST_STORED_KEY).await {
            Ok(Some(v)) => v.trim().parse().ok().filter(|ms: &i64| *ms > 0),
            Ok(None) => None,
            Err(e) => {
                warn!("reading {} failed: {}", LAST_STORED_KEY, e);
                None
            }
        }
    }

    pub async fn mark_stored(&self, at: DateTime<Utc>) {
        if let Err(e) = self
            .write_entry(LAST_STORED_KEY, at.timestamp_millis().to_string())
            .await
        {
            warn!("writing {} failed: {}", LAST_STORED_KEY, e);
        }
    }

    // Store backends may block on disk, keep them off the async workers.

    async fn read_entry(&self, key: &str) -> Result<Option<String>> {
        let store = self.store.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(|e| FetchError::Store(format!("store task failed: {}", e)))?
    }

    async fn write_entry(&self, key: &str, value: String) -> Result<()> {
        let store = self.store.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.set(&key, &value))
            .await
            .map_err(|e| FetchError::Store(format!("store task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::store::{FsStore, MemoryStore};

    const URL: &str = "https://example.org/confirmed.csv";
    const KEY: &str = "data-totals-time_series_covid19_confirmed_global";

    fn gate(source: StaticSource) -> (SourceCache, Arc<MemoryStore>, Arc<StaticSource>) {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(source);
        (SourceCache::new(store.clone(), source.clone()), store, source)
    }

    // -------------------------------------------------------------------------
    // CACHE DECISION
    // -------------------------------------------------------------------------

    #[test]
    fn test_local_newer_than_remote_loads_cache() {
        assert!(should_load_from_cache(Some(100), Some(150)));
        assert!(should_load_from_cache(Some(100), Some(100)));
    }

    #[test]
    fn test_local_older_than_remote_refetches() {
        assert!(!should_load_from_cache(Some(100), Some(50)));
    }

    #[test]
    fn test_unresolved_timestamps_refetch() {
        assert!(!should_load_from_cache(None, Some(150)));
        assert!(!should_load_from_cache(Some(100), None));
        assert!(!should_load_from_cache(None, None));
    }

    // -------------------------------------------------------------------------
    // LOAD
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_live_load_stores_payload() {
        let (gate, store, source) = gate(StaticSource::new().with(URL, "csv body"));
        assert_eq!(gate.load(KEY, URL, false).await, "csv body");
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("csv body"));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_cached_load_does_not_fetch() {
        let (gate, store, source) = gate(StaticSource::new().with(URL, "fresh"));
        store.set(KEY, "stored").unwrap();
        assert_eq!(gate.load(KEY, URL, true).await, "stored");
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cached_load_missing_entry_is_empty() {
        let (gate, _, _) = gate(StaticSource::new());
        assert_eq!(gate.load(KEY, URL, true).await, "");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_empty_and_overwrites() {
        let (gate, store, _) = gate(StaticSource::new());
        store.set(KEY, "old").unwrap();
        assert_eq!(gate.load(KEY, URL, false).await, "");
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_live_leaves_store_alone() {
        let (gate, store, _) = gate(StaticSource::new().with(URL, "x"));
        assert_eq!(gate.fetch_live(URL).await, "x");
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    // -------------------------------------------------------------------------
    // LAST STORED
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_last_stored_roundtrip() {
        let (gate, _, _) = gate(StaticSource::new());
        assert_eq!(gate.last_stored().await, None);

        let at = DateTime::from_timestamp_millis(1_585_699_200_000).unwrap();
        gate.mark_stored(at).await;
        assert_eq!(gate.last_stored().await, Some(1_585_699_200_000));
    }

    #[tokio::test]
    async fn test_last_stored_garbage_is_none() {
        let (gate, store, _) = gate(StaticSource::new());
        store.set(LAST_STORED_KEY, "yesterday").unwrap();
        assert_eq!(gate.last_stored().await, None);
    }

    // -------------------------------------------------------------------------
    // FILESYSTEM BACKEND
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "current_thread")]
    async fn test_fs_backed_gate_on_single_worker() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()).unwrap());
        let source = Arc::new(StaticSource::new().with(URL, "csv body"));
        let gate = SourceCache::new(store.clone(), source.clone());

        assert_eq!(gate.load(KEY, URL, false).await, "csv body");
        assert_eq!(gate.load(KEY, URL, true).await, "csv body");
        assert_eq!(source.fetch_count(), 1);

        let at = DateTime::from_timestamp_millis(1_585_699_200_000).unwrap();
        gate.mark_stored(at).await;
        assert_eq!(gate.last_stored().await, Some(1_585_699_200_000));
        assert_eq!(
            store.get(LAST_STORED_KEY).unwrap().as_deref(),
            Some("1585699200000")
        );
    }
}
