//! Response stores: the pluggable key-value backends for a single named cache

use crate::error::Result;
use crate::types::{CacheEntry, CacheStats, CachedResponse};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A key-value store of cached responses for one named cache.
///
/// Individual `get`/`put` operations are atomic; concurrent writers to the
/// same key are last-write-wins. Entries are disposable performance
/// artifacts, never a source of truth.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Look up a cached response, counting a hit or miss
    async fn get(&self, key: &str) -> Option<CachedResponse>;

    /// Store a response under a key, overwriting any previous entry
    async fn put(&self, key: &str, response: CachedResponse) -> Result<()>;

    /// Remove an entry, returning whether it existed
    async fn delete(&self, key: &str) -> bool;

    /// List every key currently present
    async fn list_keys(&self) -> Vec<String>;

    /// Current statistics for this store
    async fn stats(&self) -> CacheStats;
}

/// In-memory store, used in tests and for ephemeral deployments
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CachedResponse>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(response) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(response.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn put(&self, key: &str, response: CachedResponse) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), response);
        Ok(())
    }

    async fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(key).is_some()
    }

    async fn list_keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            total_size: entries.values().map(|r| r.body.len() as u64).sum(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// File-backed store: bodies on disk, metadata in memory.
///
/// Metadata is not persisted across restarts; entries are repopulated by the
/// next precache/fetch cycle. The directory itself persists so the owning
/// registry can still enumerate and purge stale cache versions.
pub struct FileStore {
    dir: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry>>,
    total_size: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FileStore {
    /// Open a file store rooted at `dir`, creating the directory if needed
    pub async fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        debug!(dir = ?dir, "File store opened");
        Ok(Self {
            dir,
            entries: RwLock::new(HashMap::new()),
            total_size: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Hash a request key into a filesystem-safe file name
    pub fn disk_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(Self::disk_key(key))
    }

    async fn remove_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = {
            let mut entries = self.entries.write().await;
            entries.remove(key)
        };

        if let Some(ref entry) = entry {
            self.total_size.fetch_sub(entry.size, Ordering::Relaxed);
            // Body file may already be gone
            let _ = fs::remove_file(&entry.path).await;
        }
        entry
    }
}

#[async_trait]
impl ResponseStore for FileStore {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(key).cloned()
        };

        if let Some(entry) = entry {
            match fs::read(&entry.path).await {
                Ok(body) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "Cache hit");
                    return Some(CachedResponse {
                        status: entry.status,
                        content_type: entry.content_type,
                        body,
                        stored_at: entry.stored_at,
                    });
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to read cached body, removing entry");
                    self.remove_entry(key).await;
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn put(&self, key: &str, response: CachedResponse) -> Result<()> {
        let path = self.body_path(key);
        let size = response.body.len() as u64;
        fs::write(&path, &response.body).await?;

        let entry = CacheEntry {
            key: key.to_string(),
            status: response.status,
            content_type: response.content_type,
            size,
            stored_at: response.stored_at,
            path,
        };

        let previous = {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), entry)
        };

        if let Some(previous) = previous {
            self.total_size.fetch_sub(previous.size, Ordering::Relaxed);
        }
        self.total_size.fetch_add(size, Ordering::Relaxed);
        debug!(key = %key, size, "Cached response");

        Ok(())
    }

    async fn delete(&self, key: &str) -> bool {
        self.remove_entry(key).await.is_some()
    }

    async fn list_keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            total_size: self.total_size.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disk_key_generation() {
        let key1 = FileStore::disk_key("GET /traveler/abc123");
        let key2 = FileStore::disk_key("GET /traveler/abc123");
        let key3 = FileStore::disk_key("GET /public/xyz789");

        // Same inputs produce same key
        assert_eq!(key1, key2);

        // Different inputs produce different keys
        assert_ne!(key1, key3);

        // Keys are hex strings (64 chars for SHA256)
        assert_eq!(key1.len(), 64);
        assert!(key1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_memory_store_put_and_get() {
        let store = MemoryStore::new();

        let response = CachedResponse::new(200, "text/html", b"<html>trip</html>".to_vec());
        store.put("GET /traveler/abc", response.clone()).await.unwrap();

        let found = store.get("GET /traveler/abc").await;
        assert!(found.is_some());
        let found = found.unwrap();
        assert_eq!(found.body, response.body);
        assert_eq!(found.content_type, "text/html");
    }

    #[tokio::test]
    async fn test_memory_store_overwrite_wins() {
        let store = MemoryStore::new();

        store
            .put("GET /", CachedResponse::new(200, "text/html", b"OLD".to_vec()))
            .await
            .unwrap();
        store
            .put("GET /", CachedResponse::new(200, "text/html", b"NEW".to_vec()))
            .await
            .unwrap();

        let found = store.get("GET /").await.unwrap();
        assert_eq!(found.body, b"NEW");
    }

    #[tokio::test]
    async fn test_memory_store_delete_and_list() {
        let store = MemoryStore::new();
        store
            .put("GET /a", CachedResponse::new(200, "text/plain", b"a".to_vec()))
            .await
            .unwrap();
        store
            .put("GET /b", CachedResponse::new(200, "text/plain", b"b".to_vec()))
            .await
            .unwrap();

        let mut keys = store.list_keys().await;
        keys.sort();
        assert_eq!(keys, vec!["GET /a".to_string(), "GET /b".to_string()]);

        assert!(store.delete("GET /a").await);
        assert!(!store.delete("GET /a").await);
        assert_eq!(store.list_keys().await, vec!["GET /b".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_store_hit_miss_counters() {
        let store = MemoryStore::new();

        store.get("GET /missing").await;
        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);

        store
            .put("GET /", CachedResponse::new(200, "text/html", b"shell".to_vec()))
            .await
            .unwrap();
        store.get("GET /").await;

        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_file_store_put_and_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();

        let response = CachedResponse::new(200, "application/json", b"{\"trip\":1}".to_vec());
        store.put("GET /api/trips/1", response.clone()).await.unwrap();

        let found = store.get("GET /api/trips/1").await;
        assert!(found.is_some());
        let found = found.unwrap();
        assert_eq!(found.body, response.body);
        assert_eq!(found.status, 200);
        assert_eq!(found.content_type, "application/json");
    }

    #[tokio::test]
    async fn test_file_store_miss() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();

        assert!(store.get("GET /nonexistent").await.is_none());
        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_file_store_delete_removes_body_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();

        store
            .put("GET /logo.png", CachedResponse::new(200, "image/png", vec![0u8; 16]))
            .await
            .unwrap();
        let body_path = dir.path().join(FileStore::disk_key("GET /logo.png"));
        assert!(body_path.exists());

        assert!(store.delete("GET /logo.png").await);
        assert!(!body_path.exists());
        assert!(store.get("GET /logo.png").await.is_none());
    }

    #[tokio::test]
    async fn test_file_store_overwrite_tracks_size() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().to_path_buf()).await.unwrap();

        store
            .put("GET /", CachedResponse::new(200, "text/html", vec![0u8; 100]))
            .await
            .unwrap();
        store
            .put("GET /", CachedResponse::new(200, "text/html", vec![0u8; 40]))
            .await
            .unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.total_size, 40);
    }
}
