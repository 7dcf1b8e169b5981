//! Cache lifecycle: install-time precaching and activation-time purge
//!
//! Mirrors the two-step worker lifecycle: `install` populates the current
//! named cache from the precache manifest, `activate` deletes every cache
//! version that is not current. The process runs install, then activate,
//! then starts serving.

use crate::error::{ProxyError, Result};
use crate::types::ProxiedRequest;
use crate::upstream::Upstream;
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;
use versioned_response_cache::{CacheRegistry, ResponseStore};

/// Open the current cache and precache every app-shell path.
///
/// Any precache failure (network error or non-200) is fatal; a proxy that
/// cannot hold the app shell must not activate. Re-running with an
/// unchanged manifest is idempotent.
pub async fn install(
    registry: &Arc<dyn CacheRegistry>,
    upstream: &Arc<dyn Upstream>,
    cache_version: &str,
    precache_paths: &[String],
) -> Result<Arc<dyn ResponseStore>> {
    let cache = registry.open(cache_version).await?;

    for path in precache_paths {
        let request = ProxiedRequest::get(path);
        let response = upstream
            .fetch(&request)
            .await
            .map_err(|e| ProxyError::Precache(format!("{}: {}", path, e)))?;

        if response.status != 200 {
            return Err(ProxyError::Precache(format!(
                "{} returned status {}",
                path, response.status
            )));
        }

        cache.put(&request.cache_key(), response.to_cached()).await?;
    }

    info!(
        cache = %cache_version,
        assets = precache_paths.len(),
        "Precache complete"
    );
    Ok(cache)
}

/// Delete every cache whose name is not the current version string.
///
/// Idempotent: running it twice leaves exactly the current cache. Returns
/// the number of caches purged.
pub async fn activate(registry: &Arc<dyn CacheRegistry>, cache_version: &str) -> Result<usize> {
    let stale: Vec<String> = registry
        .names()
        .await?
        .into_iter()
        .filter(|name| name != cache_version)
        .collect();

    let mut purged = 0;
    for result in join_all(stale.iter().map(|name| registry.remove(name))).await {
        if result? {
            purged += 1;
        }
    }

    info!(cache = %cache_version, purged, "Activation complete");
    Ok(purged)
}
