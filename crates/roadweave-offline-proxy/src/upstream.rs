//! Upstream backend client
//!
//! The upstream is the RoadWeave REST backend, treated as an opaque network
//! peer. The trait seam lets tests substitute a programmable stub.

use crate::types::{ProxiedRequest, UpstreamResponse};
use async_trait::async_trait;
use axum::http::header;
use reqwest::Client;
use std::fmt;
use tracing::debug;

/// Error reaching the upstream. Any variant means the network fetch itself
/// failed; non-success HTTP statuses come back as [`UpstreamResponse`]s.
#[derive(Debug)]
#[allow(dead_code)]
pub enum UpstreamError {
    Network(Box<reqwest::Error>),
    Unreachable(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Network(err) => write!(f, "Network error: {}", err),
            UpstreamError::Unreachable(msg) => write!(f, "Upstream unreachable: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Network(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Network(Box::new(err))
    }
}

/// A source of fresh responses for intercepted requests
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &ProxiedRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// HTTP client for the RoadWeave backend
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &ProxiedRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        debug!(method = %request.method, url = %url, "Fetching from upstream");

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(ref content_type) = request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().await?.to_vec();

        debug!(
            status,
            size = body.len(),
            content_type = %content_type,
            "Fetched from upstream"
        );

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
