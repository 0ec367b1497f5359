//! Cache layer that orchestrates freshness checks with network fetching.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

use super::storage::CacheStorage;
use super::traits::{CacheResult, Cacheable, QueryKey};

type KeyLocks = tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Cache layer between the application and the network client.
///
/// A cached value is served while it is fresh (`now - cached_at < ttl`);
/// anything else goes to the network and replaces the cached value
/// wholesale. Failures propagate to the caller; stale data is never
/// silently substituted for an error.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long before cached data must be refetched
  ttl: Duration,
  /// Coalesce concurrent fetches of the same key
  dedup_inflight: bool,
  /// Per-key locks, populated lazily. The key space is bounded by the
  /// query vocabulary, so entries are not reclaimed.
  inflight: Arc<KeyLocks>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: Duration::minutes(5),
      dedup_inflight: false,
      inflight: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
    }
  }

  /// Set the freshness window for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Enable or disable in-flight deduplication.
  ///
  /// When disabled, concurrent fetches of the same key each hit the network
  /// and the later completion wins the cache (last-write-wins).
  pub fn with_dedup_inflight(mut self, dedup: bool) -> Self {
    self.dedup_inflight = dedup;
    self
  }

  /// Check if cached data is stale based on its capture timestamp.
  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.ttl
  }

  async fn key_lock(&self, hash: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self.inflight.lock().await;
    locks
      .entry(hash.to_string())
      .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
      .clone()
  }

  /// Fetch a single entity.
  ///
  /// With `force == false` and a fresh cached value, returns the cached
  /// value without invoking the fetcher. Otherwise invokes the fetcher and
  /// stores the result with a fresh timestamp. Fetcher errors propagate and
  /// leave the previously cached value in place.
  pub async fn fetch_one<T, F, Fut>(
    &self,
    entity_key: &str,
    force: bool,
    fetcher: F,
  ) -> Result<CacheResult<T>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if !force {
      if let Some(cached) = self.storage.get_entity::<T>(entity_key)? {
        if !self.is_stale(cached.cached_at) {
          debug!(entity_type = T::entity_type(), key = entity_key, "cache hit");
          return Ok(CacheResult::from_cache(cached.entity, cached.cached_at));
        }
      }
    }

    let _guard = if self.dedup_inflight {
      let lock = self
        .key_lock(&format!("{}:{}", T::entity_type(), entity_key))
        .await;
      let guard = lock.lock_owned().await;

      // The fetch we waited on may have filled the cache.
      if !force {
        if let Some(cached) = self.storage.get_entity::<T>(entity_key)? {
          if !self.is_stale(cached.cached_at) {
            debug!(
              entity_type = T::entity_type(),
              key = entity_key,
              "cache filled while waiting on in-flight fetch"
            );
            return Ok(CacheResult::from_cache(cached.entity, cached.cached_at));
          }
        }
      }
      Some(guard)
    } else {
      None
    };

    debug!(entity_type = T::entity_type(), key = entity_key, force, "fetching");
    let data = fetcher().await?;
    self.storage.store_entity(&data)?;
    Ok(CacheResult::from_network(data))
  }

  /// Fetch a list identified by a query key. Same contract as
  /// [`CacheLayer::fetch_one`].
  pub async fn fetch_list<T, K, F, Fut>(
    &self,
    key: &K,
    force: bool,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let hash = key.cache_hash();

    if !force {
      if let Some(cached) = self.storage.get_query_result::<T>(&hash)? {
        if !self.is_stale(cached.cached_at) {
          debug!(query = %key.description(), "cache hit");
          return Ok(CacheResult::from_cache(cached.entities, cached.cached_at));
        }
      }
    }

    let _guard = if self.dedup_inflight {
      let lock = self.key_lock(&hash).await;
      let guard = lock.lock_owned().await;

      if !force {
        if let Some(cached) = self.storage.get_query_result::<T>(&hash)? {
          if !self.is_stale(cached.cached_at) {
            debug!(
              query = %key.description(),
              "cache filled while waiting on in-flight fetch"
            );
            return Ok(CacheResult::from_cache(cached.entities, cached.cached_at));
          }
        }
      }
      Some(guard)
    } else {
      None
    };

    debug!(query = %key.description(), force, "fetching");
    let data = fetcher().await?;
    self.storage.store_query_result(&hash, &data)?;
    Ok(CacheResult::from_network(data))
  }

  /// Read the cached value for an entity without fetching, ignoring
  /// freshness. Used by mutations that patch a sub-field of a cached
  /// object.
  pub fn peek<T: Cacheable>(&self, entity_key: &str) -> Result<Option<T>> {
    Ok(self.storage.get_entity::<T>(entity_key)?.map(|c| c.entity))
  }

  /// Replace a cached entity wholesale and refresh its timestamp.
  pub fn store<T: Cacheable>(&self, entity: &T) -> Result<()> {
    self.storage.store_entity(entity)
  }

  /// Drop a single cached entity.
  pub fn invalidate_entity<T: Cacheable>(&self, entity_key: &str) -> Result<()> {
    self.storage.remove_entity(T::entity_type(), entity_key)
  }

  /// Drop a single cached query result.
  pub fn invalidate_query<K: QueryKey>(&self, key: &K) -> Result<()> {
    self.storage.remove_query(&key.cache_hash())
  }

  /// Drop every cached list of the given entity type, so the next read
  /// refetches. Called after mutations.
  pub fn invalidate_lists(&self, entity_type: &str) -> Result<()> {
    self.storage.remove_queries_for(entity_type)
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
      dedup_inflight: self.dedup_inflight,
      inflight: Arc::clone(&self.inflight),
    }
  }
}
