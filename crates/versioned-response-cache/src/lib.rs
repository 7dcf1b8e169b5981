//! Versioned response caching with pluggable stores
//!
//! Provides named (version-string keyed) caches of HTTP responses. Exactly
//! one cache version is meant to be current at a time; a registry exposes
//! the full set of names so stale versions can be purged on activation.
//! Stores are behind a trait so services can run file-backed in production
//! and in-memory in tests.

mod error;
mod registry;
mod store;
mod types;

pub use error::{CacheError, Result};
pub use registry::{CacheRegistry, FileRegistry, MemoryRegistry};
pub use store::{FileStore, MemoryStore, ResponseStore};
pub use types::{CacheEntry, CacheStats, CachedResponse};
