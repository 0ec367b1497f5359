//! Generic caching layer for remotely-sourced resources.
//!
//! This module is domain-agnostic. It:
//! - Caches entities with a key and a capture timestamp
//! - Treats a cached value as fresh while `now - cached_at < ttl`
//! - Handles full lists and individual item lookups
//! - Replaces cached values wholesale; there are no partial updates
//! - Optionally coalesces concurrent fetches of the same key

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{
  CacheStorage, CachedEntity, CachedQueryResult, MemoryStorage, NoopStorage, SqliteStorage, Storage,
};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey};
