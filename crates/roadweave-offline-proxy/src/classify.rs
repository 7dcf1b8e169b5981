//! Request classification into a closed set of route kinds
//!
//! Each intercepted request maps to exactly one `RouteKind`; the server
//! dispatches each kind to a dedicated caching strategy.

use axum::http::Method;

/// Marker segment for traveler PWA pages
pub const TRAVELER_MARKER: &str = "/traveler/";

/// Marker segment for public blog pages
pub const PUBLIC_MARKER: &str = "/public/";

/// Marker segment for entry submissions, which select the offline
/// "request queued" fallback
pub const ENTRIES_MARKER: &str = "/entries";

/// Route kinds recognized by the cache manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// App-shell asset listed in the precache manifest
    StaticAsset,
    /// Traveler PWA page, served stale-while-revalidate
    TravelerPage,
    /// Public blog page, served stale-while-revalidate
    PublicPage,
    /// Entry submission POST, never cached
    EntrySubmission,
    /// Everything else, served cache-first
    Other,
}

/// Classify a request by method and URL path.
///
/// Only GET requests classify as cacheable pages; the cache never holds
/// responses to mutating methods.
pub fn classify(method: &Method, path: &str, precache_paths: &[String]) -> RouteKind {
    if *method == Method::POST && path.contains(ENTRIES_MARKER) {
        return RouteKind::EntrySubmission;
    }

    if *method == Method::GET {
        if path.contains(TRAVELER_MARKER) {
            return RouteKind::TravelerPage;
        }
        if path.contains(PUBLIC_MARKER) {
            return RouteKind::PublicPage;
        }
        if precache_paths.iter().any(|p| p == path) {
            return RouteKind::StaticAsset;
        }
    }

    RouteKind::Other
}
