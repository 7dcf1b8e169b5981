//! Core types for the RoadWeave offline cache proxy

use axum::http::Method;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use versioned_response_cache::{CacheStats, CachedResponse};

/// Configuration for the proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub upstream_url: String,
    pub cache_dir: PathBuf,
    /// Current cache version. Bumped on every deployment that changes the
    /// precached assets or the fetch logic; activation purges the rest.
    pub cache_version: String,
    /// App-shell paths fetched and stored at install time
    pub precache_paths: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 3002,
            upstream_url: "http://localhost:5000".to_string(),
            cache_dir: PathBuf::from("./cache/responses"),
            cache_version: "roadweave-v2".to_string(),
            precache_paths: vec![
                "/".to_string(),
                "/manifest.json".to_string(),
                "/logo.png".to_string(),
                "/logo192.png".to_string(),
                "/logo512.png".to_string(),
            ],
        }
    }
}

/// An intercepted client request, reduced to what the caching layer needs
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ProxiedRequest {
    /// A bare GET request, used for precaching and tests
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path_and_query: path.to_string(),
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Cache key for this request. The gateway fronts a single origin, so
    /// method plus path-and-query is the request's identity.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.path_and_query)
    }
}

/// A response fetched from the upstream backend
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn to_cached(&self) -> CachedResponse {
        CachedResponse {
            status: self.status,
            content_type: self.content_type.clone(),
            body: self.body.clone(),
            stored_at: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache_version: String,
    pub cache: CacheStats,
}
