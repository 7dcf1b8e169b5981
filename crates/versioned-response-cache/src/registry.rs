//! Named cache registry: open, enumerate and purge cache versions

use crate::error::{CacheError, Result};
use crate::store::{FileStore, MemoryStore, ResponseStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A registry of named caches, one per cache version string.
///
/// The registry does not track which name is "current"; the activation step
/// of the owning service enforces that by purging every other name.
#[async_trait]
pub trait CacheRegistry: Send + Sync {
    /// Open the named cache, creating it if absent. Reopening returns the
    /// same underlying store.
    async fn open(&self, name: &str) -> Result<Arc<dyn ResponseStore>>;

    /// Every cache name currently present, including ones left behind by a
    /// previous process version
    async fn names(&self) -> Result<Vec<String>>;

    /// Delete a named cache and its storage, returning whether it existed
    async fn remove(&self, name: &str) -> Result<bool>;
}

/// In-memory registry over [`MemoryStore`]s
#[derive(Default)]
pub struct MemoryRegistry {
    caches: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheRegistry for MemoryRegistry {
    async fn open(&self, name: &str) -> Result<Arc<dyn ResponseStore>> {
        let mut caches = self.caches.write().await;
        let store = caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new()))
            .clone();
        Ok(store)
    }

    async fn names(&self) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches.keys().cloned().collect())
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        Ok(caches.remove(name).is_some())
    }
}

/// File-backed registry: one subdirectory per cache name under a root dir
pub struct FileRegistry {
    root: PathBuf,
    open_stores: RwLock<HashMap<String, Arc<FileStore>>>,
}

impl FileRegistry {
    /// Create a registry rooted at `root`, creating the directory if needed
    pub async fn open(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        info!(root = ?root, "Cache registry opened");
        Ok(Self {
            root,
            open_stores: RwLock::new(HashMap::new()),
        })
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        // Cache names become directory names; refuse anything that could
        // escape the registry root
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(CacheError::Store(format!("invalid cache name: {:?}", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheRegistry for FileRegistry {
    async fn open(&self, name: &str) -> Result<Arc<dyn ResponseStore>> {
        let dir = self.cache_dir(name)?;

        let mut open_stores = self.open_stores.write().await;
        if let Some(store) = open_stores.get(name) {
            return Ok(store.clone());
        }

        let store = Arc::new(FileStore::open(dir).await?);
        open_stores.insert(name.to_string(), store.clone());
        debug!(name = %name, "Opened named cache");
        Ok(store)
    }

    async fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;

        {
            let mut open_stores = self.open_stores.write().await;
            open_stores.remove(name);
        }

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(name = %name, "Removed named cache");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
