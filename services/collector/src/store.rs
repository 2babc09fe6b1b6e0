//! Key/value cache stores for raw source text
//!
//! The store is an injected collaborator: the gate only needs `get`/`set`.
//! `FsStore` keeps one file per key plus a `.sha256` sidecar so that a
//! truncated or hand-edited entry reads as a miss.

use crate::error::{FetchError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// Key holding the epoch-millisecond time of the last successful store
pub const LAST_STORED_KEY: &str = "lastStorage";

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Content hash in the `sha256:<hex>` form used for stored entries
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| FetchError::Store("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| FetchError::Store("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Filesystem store
// =============================================================================

#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.txt", name))
    }

    fn hash_path(entry: &Path) -> PathBuf {
        entry.with_extension("sha256")
    }
}

impl CacheStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path)?;
        let expected = fs::read_to_string(Self::hash_path(&path)).unwrap_or_default();
        if expected.trim() != content_hash(value.as_bytes()) {
            warn!("cache entry '{}' failed hash check, treating as miss", key);
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, value)?;
        fs::write(Self::hash_path(&path), content_hash(value.as_bytes()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_format() {
        let hash = content_hash(b"abc");
        assert_eq!(
            hash,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        assert_eq!(store.get(LAST_STORED_KEY).unwrap(), None);

        store.set(LAST_STORED_KEY, "1585699200000").unwrap();
        assert_eq!(
            store.get(LAST_STORED_KEY).unwrap().as_deref(),
            Some("1585699200000")
        );
    }

    #[test]
    fn test_fs_store_tampered_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        store.set("data-daily-04-01-2020", "a,b\n1,2\n").unwrap();

        let path = store.entry_path("data-daily-04-01-2020");
        fs::write(&path, "a,b\n1,").unwrap();
        assert_eq!(store.get("data-daily-04-01-2020").unwrap(), None);
    }

    #[test]
    fn test_fs_store_key_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        store.set("../escape/key", "x").unwrap();
        assert_eq!(store.get("../escape/key").unwrap().as_deref(), Some("x"));
        assert!(dir.path().join("___escape_key.txt").exists());
    }
}
