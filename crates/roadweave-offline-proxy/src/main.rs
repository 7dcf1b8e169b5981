//! RoadWeave offline cache proxy
//!
//! A caching gateway in front of the RoadWeave travel-blog backend. Traveler
//! and public blog pages are served stale-while-revalidate, app-shell assets
//! are precached at startup and served cache-first, and entry submissions
//! made while the backend is unreachable receive a queued placeholder
//! instead of an error.

mod classify;
mod error;
mod lifecycle;
mod server;
mod strategy;
mod types;
mod upstream;

use crate::error::{ProxyError, Result};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ProxyConfig;
use crate::upstream::{HttpUpstream, Upstream};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use versioned_response_cache::{CacheRegistry, FileRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("roadweave_offline_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting RoadWeave offline cache proxy...");

    // Load configuration from environment
    let config = load_config();
    info!("Port: {}", config.port);
    info!("Upstream: {}", config.upstream_url);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache version: {}", config.cache_version);
    info!("Precache manifest: {} paths", config.precache_paths.len());

    let registry: Arc<dyn CacheRegistry> =
        Arc::new(FileRegistry::open(config.cache_dir.clone()).await?);
    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(config.upstream_url.clone()));

    // Install: precache the app shell into the current cache version.
    // A failed precache fetch is fatal; the proxy must not activate without
    // the shell.
    let cache = lifecycle::install(
        &registry,
        &upstream,
        &config.cache_version,
        &config.precache_paths,
    )
    .await?;

    // Activate: purge caches left behind by prior deployments
    lifecycle::activate(&registry, &config.cache_version).await?;

    // Create shared state and serve
    let state: SharedState = Arc::new(ServerState::new(
        cache,
        upstream,
        config.cache_version.clone(),
        config.precache_paths.clone(),
    ));

    start_server(state, config.port)
        .await
        .map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

fn load_config() -> ProxyConfig {
    let defaults = ProxyConfig::default();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let upstream_url =
        std::env::var("UPSTREAM_URL").unwrap_or_else(|_| defaults.upstream_url.clone());

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| defaults.cache_dir.clone());

    let cache_version =
        std::env::var("CACHE_VERSION").unwrap_or_else(|_| defaults.cache_version.clone());

    let precache_paths = std::env::var("PRECACHE_PATHS")
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| defaults.precache_paths.clone());

    ProxyConfig {
        port,
        upstream_url,
        cache_dir,
        cache_version,
        precache_paths,
    }
}
