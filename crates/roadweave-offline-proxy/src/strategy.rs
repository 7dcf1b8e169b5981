//! Per-route caching strategies
//!
//! Traveler and public pages are served stale-while-revalidate: a cache hit
//! is returned immediately and a detached task refreshes the entry. Entry
//! submissions are never cached and degrade to a 202 "request queued"
//! placeholder when the backend is unreachable. Everything else is
//! cache-first with no revalidation.

use crate::classify::ENTRIES_MARKER;
use crate::types::{ProxiedRequest, UpstreamResponse};
use crate::upstream::Upstream;
use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use axum::response::Response;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use versioned_response_cache::{CachedResponse, ResponseStore};

/// Body of the generic offline fallback
const OFFLINE_BODY: &str = "Offline";

/// Stale-while-revalidate: serve the cached response immediately and refresh
/// it in the background; on a miss, fetch and cache a 200.
pub async fn stale_while_revalidate(
    cache: &Arc<dyn ResponseStore>,
    upstream: &Arc<dyn Upstream>,
    request: ProxiedRequest,
) -> Response {
    let key = request.cache_key();

    if let Some(cached) = cache.get(&key).await {
        // The client gets the stale entry now; the refresh races
        // independently and is never awaited here. Concurrent requests for
        // the same key each spawn their own refresh; last write wins.
        spawn_revalidation(cache.clone(), upstream.clone(), request);
        return cached_response(&cached, "HIT");
    }

    match upstream.fetch(&request).await {
        Ok(fresh) => {
            if fresh.status == 200 {
                if let Err(e) = cache.put(&key, fresh.to_cached()).await {
                    warn!(key = %key, error = %e, "Failed to cache response");
                }
            }
            upstream_response(&fresh)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Upstream unreachable, serving offline fallback");
            offline_fallback(&request)
        }
    }
}

/// Cache-first with no revalidation: a hit is served as-is, a miss goes to
/// the network and is returned without being cached.
pub async fn cache_first(
    cache: &Arc<dyn ResponseStore>,
    upstream: &Arc<dyn Upstream>,
    request: ProxiedRequest,
) -> Response {
    let is_read = request.method == Method::GET || request.method == Method::HEAD;

    if is_read {
        if let Some(cached) = cache.get(&request.cache_key()).await {
            return cached_response(&cached, "HIT");
        }
    }

    match upstream.fetch(&request).await {
        Ok(fresh) => upstream_response(&fresh),
        Err(e) => {
            warn!(key = %request.cache_key(), error = %e, "Upstream unreachable, serving offline fallback");
            offline_fallback(&request)
        }
    }
}

/// Entry submissions are never cached; forward the POST and synthesize the
/// queued placeholder when the backend is unreachable.
pub async fn submit_entry(upstream: &Arc<dyn Upstream>, request: ProxiedRequest) -> Response {
    match upstream.fetch(&request).await {
        Ok(fresh) => upstream_response(&fresh),
        Err(e) => {
            warn!(key = %request.cache_key(), error = %e, "Entry submission while offline, returning placeholder");
            offline_entry_response()
        }
    }
}

/// Spawn the detached revalidation task for a served-stale entry. Failures
/// are logged inside the task and never surface to the response path.
pub fn spawn_revalidation(
    cache: Arc<dyn ResponseStore>,
    upstream: Arc<dyn Upstream>,
    request: ProxiedRequest,
) {
    tokio::spawn(async move {
        revalidate(&cache, &upstream, &request).await;
    });
}

/// Refresh one cache entry from upstream. Only a 200 overwrites the entry;
/// every failure is swallowed because the client already has a usable
/// (possibly stale) response.
pub async fn revalidate(
    cache: &Arc<dyn ResponseStore>,
    upstream: &Arc<dyn Upstream>,
    request: &ProxiedRequest,
) {
    let key = request.cache_key();
    match upstream.fetch(request).await {
        Ok(fresh) if fresh.status == 200 => {
            if let Err(e) = cache.put(&key, fresh.to_cached()).await {
                warn!(key = %key, error = %e, "Failed to refresh cache entry");
            } else {
                debug!(key = %key, "Cache entry refreshed");
            }
        }
        Ok(fresh) => {
            debug!(key = %key, status = fresh.status, "Skipping refresh for non-200 response");
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Background revalidation failed");
        }
    }
}

/// Offline fallback selection: entry submission POSTs get the 202 queued
/// placeholder, everything else the generic 503.
pub fn offline_fallback(request: &ProxiedRequest) -> Response {
    if request.method == Method::POST && request.path_and_query.contains(ENTRIES_MARKER) {
        offline_entry_response()
    } else {
        offline_response()
    }
}

/// Placeholder for an entry submission made while offline
pub fn offline_entry_response() -> Response {
    let body = json!({
        "error": "Offline - request queued",
        "offline": true,
    });

    Response::builder()
        .status(StatusCode::ACCEPTED)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Generic offline fallback
pub fn offline_response() -> Response {
    Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(OFFLINE_BODY))
        .unwrap()
}

fn cached_response(cached: &CachedResponse, x_cache: &str) -> Response {
    Response::builder()
        .status(StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK))
        .header(header::CONTENT_TYPE, cached.content_type.as_str())
        .header("X-Cache", x_cache)
        .body(Body::from(cached.body.clone()))
        .unwrap()
}

fn upstream_response(fresh: &UpstreamResponse) -> Response {
    Response::builder()
        .status(StatusCode::from_u16(fresh.status).unwrap_or(StatusCode::BAD_GATEWAY))
        .header(header::CONTENT_TYPE, fresh.content_type.as_str())
        .header("X-Cache", "MISS")
        .body(Body::from(fresh.body.clone()))
        .unwrap()
}
