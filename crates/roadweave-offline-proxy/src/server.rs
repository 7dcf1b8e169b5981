//! HTTP server that intercepts every client request
//!
//! Provides /health plus a fallback handler that classifies each request
//! and dispatches it to the matching caching strategy.

use crate::classify::{classify, RouteKind};
use crate::strategy;
use crate::types::{HealthResponse, ProxiedRequest};
use crate::upstream::Upstream;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use versioned_response_cache::ResponseStore;

/// Largest request body the proxy will buffer. Entry submissions carry
/// photo and audio payloads.
const MAX_REQUEST_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: Arc<dyn ResponseStore>,
    pub upstream: Arc<dyn Upstream>,
    pub cache_version: String,
    pub precache_paths: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        cache: Arc<dyn ResponseStore>,
        upstream: Arc<dyn Upstream>,
        cache_version: String,
        precache_paths: Vec<String>,
    ) -> Self {
        Self {
            cache,
            upstream,
            cache_version,
            precache_paths,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(intercept)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache_version: state.cache_version.clone(),
        cache: cache_stats,
    })
}

/// Intercept any request not handled by a named route, classify it and
/// dispatch to the matching strategy
async fn intercept(State(state): State<SharedState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let path = parts.uri.path().to_string();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let proxied = ProxiedRequest {
        method: parts.method,
        path_and_query,
        content_type,
        body,
    };

    match classify(&proxied.method, &path, &state.precache_paths) {
        RouteKind::TravelerPage | RouteKind::PublicPage => {
            strategy::stale_while_revalidate(&state.cache, &state.upstream, proxied).await
        }
        RouteKind::EntrySubmission => strategy::submit_entry(&state.upstream, proxied).await,
        RouteKind::StaticAsset | RouteKind::Other => {
            strategy::cache_first(&state.cache, &state.upstream, proxied).await
        }
    }
}
