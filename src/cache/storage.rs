//! Cache storage trait with in-memory, SQLite and no-op implementations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::CacheConfig;
use crate::error::{Error, Result};

use super::traits::Cacheable;

/// Result of a cached query lookup.
#[derive(Debug, Clone)]
pub struct CachedQueryResult<T> {
  /// The cached entities in order
  pub entities: Vec<T>,
  /// When the query result was cached
  pub cached_at: DateTime<Utc>,
}

/// A single cached entity.
#[derive(Debug, Clone)]
pub struct CachedEntity<T> {
  /// The cached entity
  pub entity: T,
  /// When the entity was cached
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Store a single entity, replacing any previous value wholesale.
  fn store_entity<T: Cacheable>(&self, entity: &T) -> Result<()>;

  /// Get a single entity by key.
  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>>;

  /// Remove a single entity.
  fn remove_entity(&self, entity_type: &str, entity_key: &str) -> Result<()>;

  /// Store entities from a query result, replacing the previous result.
  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()>;

  /// Get cached entities for a query.
  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>>;

  /// Remove a single query result.
  fn remove_query(&self, key: &str) -> Result<()>;

  /// Remove every query result holding entities of the given type.
  /// Used after mutations so list views refetch.
  fn remove_queries_for(&self, entity_type: &str) -> Result<()>;
}

// ============================================================================
// No-op storage
// ============================================================================

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store_entity<T: Cacheable>(&self, _entity: &T) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_entity<T: Cacheable>(&self, _entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    Ok(None) // Always miss
  }

  fn remove_entity(&self, _entity_type: &str, _entity_key: &str) -> Result<()> {
    Ok(())
  }

  fn store_query_result<T: Cacheable>(&self, _key: &str, _entities: &[T]) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_query_result<T: Cacheable>(&self, _key: &str) -> Result<Option<CachedQueryResult<T>>> {
    Ok(None) // Always miss
  }

  fn remove_query(&self, _key: &str) -> Result<()> {
    Ok(())
  }

  fn remove_queries_for(&self, _entity_type: &str) -> Result<()> {
    Ok(())
  }
}

// ============================================================================
// In-memory storage
// ============================================================================

#[derive(Debug, Clone)]
struct StoredEntity {
  data: serde_json::Value,
  cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredQuery {
  entity_type: String,
  /// Entity keys in result order; the entities themselves live in the
  /// entity table so a later single-entity store is visible to list reads.
  keys: Vec<String>,
  cached_at: DateTime<Utc>,
}

/// In-memory cache storage. The default; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
  entities: Mutex<HashMap<(String, String), StoredEntity>>,
  queries: Mutex<HashMap<String, StoredQuery>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock_entities(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), StoredEntity>>> {
    self
      .entities
      .lock()
      .map_err(|e| Error::Storage(format!("lock poisoned: {}", e)))
  }

  fn lock_queries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredQuery>>> {
    self
      .queries
      .lock()
      .map_err(|e| Error::Storage(format!("lock poisoned: {}", e)))
  }
}

impl CacheStorage for MemoryStorage {
  fn store_entity<T: Cacheable>(&self, entity: &T) -> Result<()> {
    let data = serde_json::to_value(entity)?;
    self.lock_entities()?.insert(
      (T::entity_type().to_string(), entity.cache_key()),
      StoredEntity {
        data,
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    let entities = self.lock_entities()?;
    let stored = match entities.get(&(T::entity_type().to_string(), entity_key.to_string())) {
      Some(s) => s.clone(),
      None => return Ok(None),
    };
    drop(entities);

    let entity: T = serde_json::from_value(stored.data)?;
    Ok(Some(CachedEntity {
      entity,
      cached_at: stored.cached_at,
    }))
  }

  fn remove_entity(&self, entity_type: &str, entity_key: &str) -> Result<()> {
    self
      .lock_entities()?
      .remove(&(entity_type.to_string(), entity_key.to_string()));
    Ok(())
  }

  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()> {
    let now = Utc::now();
    let mut keys = Vec::with_capacity(entities.len());

    let mut entity_map = self.lock_entities()?;
    for entity in entities {
      let entity_key = entity.cache_key();
      let data = serde_json::to_value(entity)?;
      entity_map.insert(
        (T::entity_type().to_string(), entity_key.clone()),
        StoredEntity {
          data,
          cached_at: now,
        },
      );
      keys.push(entity_key);
    }
    drop(entity_map);

    self.lock_queries()?.insert(
      key.to_string(),
      StoredQuery {
        entity_type: T::entity_type().to_string(),
        keys,
        cached_at: now,
      },
    );
    Ok(())
  }

  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    let queries = self.lock_queries()?;
    let stored = match queries.get(key) {
      Some(q) if q.entity_type == T::entity_type() => q.clone(),
      _ => return Ok(None),
    };
    drop(queries);

    let entity_map = self.lock_entities()?;
    let entities: Vec<T> = stored
      .keys
      .iter()
      .filter_map(|k| entity_map.get(&(stored.entity_type.clone(), k.clone())))
      .filter_map(|s| serde_json::from_value(s.data.clone()).ok())
      .collect();

    Ok(Some(CachedQueryResult {
      entities,
      cached_at: stored.cached_at,
    }))
  }

  fn remove_query(&self, key: &str) -> Result<()> {
    self.lock_queries()?.remove(key);
    Ok(())
  }

  fn remove_queries_for(&self, entity_type: &str) -> Result<()> {
    self
      .lock_queries()?
      .retain(|_, q| q.entity_type != entity_type);
    Ok(())
  }
}

// ============================================================================
// SQLite storage
// ============================================================================

/// SQLite-backed cache storage, used when the cache is configured to persist
/// between runs.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Generic entity cache (stores serialized JSON)
CREATE TABLE IF NOT EXISTS entity_cache (
    entity_type TEXT NOT NULL,
    entity_key TEXT NOT NULL,
    data BLOB NOT NULL,
    updated_at TEXT,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (entity_type, entity_key)
);

-- Query result tracking
CREATE TABLE IF NOT EXISTS query_cache (
    query_hash TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    result_count INTEGER NOT NULL
);

-- Query to entity mapping (preserves order)
CREATE TABLE IF NOT EXISTS query_results (
    query_hash TEXT NOT NULL,
    entity_key TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (query_hash, entity_key),
    FOREIGN KEY (query_hash) REFERENCES query_cache(query_hash) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_query_results_hash ON query_results(query_hash);
"#;

impl SqliteStorage {
  /// Open or create the cache database at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the cache database at the given path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| Error::Storage(format!("failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      Error::Storage(format!(
        "failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| Error::Storage(format!("failed to run cache migrations: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| Error::Storage("could not determine data directory".to_string()))?;

    Ok(data_dir.join("souk").join("cache.db"))
  }

  fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| Error::Storage(format!("lock poisoned: {}", e)))
  }
}

impl CacheStorage for SqliteStorage {
  fn store_entity<T: Cacheable>(&self, entity: &T) -> Result<()> {
    let conn = self.lock_conn()?;
    let data = serde_json::to_vec(entity)?;

    conn.execute(
      "INSERT OR REPLACE INTO entity_cache (entity_type, entity_key, data, updated_at, cached_at)
       VALUES (?, ?, ?, ?, datetime('now'))",
      params![
        T::entity_type(),
        entity.cache_key(),
        data,
        entity.updated_at()
      ],
    )?;

    Ok(())
  }

  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    let conn = self.lock_conn()?;

    let mut stmt = conn.prepare(
      "SELECT data, cached_at FROM entity_cache
       WHERE entity_type = ? AND entity_key = ?",
    )?;

    let row: Option<(Vec<u8>, String)> = stmt
      .query_row(params![T::entity_type(), entity_key], |row| {
        Ok((row.get(0)?, row.get(1)?))
      })
      .ok();

    match row {
      Some((data, cached_at_str)) => {
        let entity: T = serde_json::from_slice(&data)?;
        Ok(Some(CachedEntity {
          entity,
          cached_at: parse_datetime(&cached_at_str)?,
        }))
      }
      None => Ok(None),
    }
  }

  fn remove_entity(&self, entity_type: &str, entity_key: &str) -> Result<()> {
    let conn = self.lock_conn()?;
    conn.execute(
      "DELETE FROM entity_cache WHERE entity_type = ? AND entity_key = ?",
      params![entity_type, entity_key],
    )?;
    Ok(())
  }

  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()> {
    let mut conn = self.lock_conn()?;
    let entity_type = T::entity_type();

    let tx = conn
      .transaction()
      .map_err(|e| Error::Storage(format!("failed to begin transaction: {}", e)))?;

    // Replace the previous result wholesale
    tx.execute(
      "DELETE FROM query_results WHERE query_hash = ?",
      params![key],
    )?;
    tx.execute(
      "INSERT OR REPLACE INTO query_cache (query_hash, entity_type, cached_at, result_count)
       VALUES (?, ?, datetime('now'), ?)",
      params![key, entity_type, entities.len()],
    )?;

    for (position, entity) in entities.iter().enumerate() {
      let entity_key = entity.cache_key();
      let data = serde_json::to_vec(entity)?;

      tx.execute(
        "INSERT OR REPLACE INTO entity_cache (entity_type, entity_key, data, updated_at, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![entity_type, entity_key, data, entity.updated_at()],
      )?;
      tx.execute(
        "INSERT OR REPLACE INTO query_results (query_hash, entity_key, position)
         VALUES (?, ?, ?)",
        params![key, entity_key, position],
      )?;
    }

    tx.commit()
      .map_err(|e| Error::Storage(format!("failed to commit transaction: {}", e)))?;

    Ok(())
  }

  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    let conn = self.lock_conn()?;
    let entity_type = T::entity_type();

    let mut stmt = conn.prepare(
      "SELECT cached_at FROM query_cache
       WHERE query_hash = ? AND entity_type = ?",
    )?;

    let cached_at_str: Option<String> = stmt
      .query_row(params![key, entity_type], |row| row.get(0))
      .ok();

    let cached_at = match cached_at_str {
      Some(s) => parse_datetime(&s)?,
      None => return Ok(None),
    };

    // Get entities in order
    let mut stmt = conn.prepare(
      "SELECT ec.data FROM entity_cache ec
       INNER JOIN query_results qr ON ec.entity_type = ? AND ec.entity_key = qr.entity_key
       WHERE qr.query_hash = ?
       ORDER BY qr.position",
    )?;

    let entities: Vec<T> = stmt
      .query_map(params![entity_type, key], |row| {
        let data: Vec<u8> = row.get(0)?;
        Ok(data)
      })?
      .filter_map(|r| r.ok())
      .filter_map(|data| serde_json::from_slice(&data).ok())
      .collect();

    Ok(Some(CachedQueryResult {
      entities,
      cached_at,
    }))
  }

  fn remove_query(&self, key: &str) -> Result<()> {
    let conn = self.lock_conn()?;
    conn.execute("DELETE FROM query_results WHERE query_hash = ?", params![key])?;
    conn.execute("DELETE FROM query_cache WHERE query_hash = ?", params![key])?;
    Ok(())
  }

  fn remove_queries_for(&self, entity_type: &str) -> Result<()> {
    let conn = self.lock_conn()?;
    conn.execute(
      "DELETE FROM query_results WHERE query_hash IN
         (SELECT query_hash FROM query_cache WHERE entity_type = ?)",
      params![entity_type],
    )?;
    conn.execute(
      "DELETE FROM query_cache WHERE entity_type = ?",
      params![entity_type],
    )?;
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| Error::Storage(format!("failed to parse datetime '{}': {}", s, e)))
}

// ============================================================================
// Configuration-driven selection
// ============================================================================

/// Closed set of storage backends, selected from configuration.
pub enum Storage {
  Memory(MemoryStorage),
  Sqlite(SqliteStorage),
  Noop(NoopStorage),
}

impl Storage {
  /// Pick a backend per the cache configuration.
  pub fn from_config(config: &CacheConfig) -> Result<Self> {
    if !config.persist {
      return Ok(Storage::Memory(MemoryStorage::new()));
    }
    match &config.path {
      Some(path) => Ok(Storage::Sqlite(SqliteStorage::open_at(path)?)),
      None => Ok(Storage::Sqlite(SqliteStorage::open()?)),
    }
  }
}

impl CacheStorage for Storage {
  fn store_entity<T: Cacheable>(&self, entity: &T) -> Result<()> {
    match self {
      Storage::Memory(s) => s.store_entity(entity),
      Storage::Sqlite(s) => s.store_entity(entity),
      Storage::Noop(s) => s.store_entity(entity),
    }
  }

  fn get_entity<T: Cacheable>(&self, entity_key: &str) -> Result<Option<CachedEntity<T>>> {
    match self {
      Storage::Memory(s) => s.get_entity(entity_key),
      Storage::Sqlite(s) => s.get_entity(entity_key),
      Storage::Noop(s) => s.get_entity(entity_key),
    }
  }

  fn remove_entity(&self, entity_type: &str, entity_key: &str) -> Result<()> {
    match self {
      Storage::Memory(s) => s.remove_entity(entity_type, entity_key),
      Storage::Sqlite(s) => s.remove_entity(entity_type, entity_key),
      Storage::Noop(s) => s.remove_entity(entity_type, entity_key),
    }
  }

  fn store_query_result<T: Cacheable>(&self, key: &str, entities: &[T]) -> Result<()> {
    match self {
      Storage::Memory(s) => s.store_query_result(key, entities),
      Storage::Sqlite(s) => s.store_query_result(key, entities),
      Storage::Noop(s) => s.store_query_result(key, entities),
    }
  }

  fn get_query_result<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    match self {
      Storage::Memory(s) => s.get_query_result(key),
      Storage::Sqlite(s) => s.get_query_result(key),
      Storage::Noop(s) => s.get_query_result(key),
    }
  }

  fn remove_query(&self, key: &str) -> Result<()> {
    match self {
      Storage::Memory(s) => s.remove_query(key),
      Storage::Sqlite(s) => s.remove_query(key),
      Storage::Noop(s) => s.remove_query(key),
    }
  }

  fn remove_queries_for(&self, entity_type: &str) -> Result<()> {
    match self {
      Storage::Memory(s) => s.remove_queries_for(entity_type),
      Storage::Sqlite(s) => s.remove_queries_for(entity_type),
      Storage::Noop(s) => s.remove_queries_for(entity_type),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Widget {
    id: String,
    name: String,
    updated: String,
  }

  impl Cacheable for Widget {
    fn cache_key(&self) -> String {
      self.id.clone()
    }

    fn updated_at(&self) -> Option<&str> {
      Some(&self.updated)
    }

    fn entity_type() -> &'static str {
      "widget"
    }
  }

  fn widget(id: &str, name: &str) -> Widget {
    Widget {
      id: id.to_string(),
      name: name.to_string(),
      updated: "2026-01-01T00:00:00Z".to_string(),
    }
  }

  fn roundtrip(storage: &impl CacheStorage) {
    assert!(storage.get_entity::<Widget>("w1").unwrap().is_none());

    storage.store_entity(&widget("w1", "first")).unwrap();
    let cached = storage.get_entity::<Widget>("w1").unwrap().unwrap();
    assert_eq!(cached.entity, widget("w1", "first"));

    // Wholesale replacement
    storage.store_entity(&widget("w1", "second")).unwrap();
    let cached = storage.get_entity::<Widget>("w1").unwrap().unwrap();
    assert_eq!(cached.entity.name, "second");

    storage.remove_entity("widget", "w1").unwrap();
    assert!(storage.get_entity::<Widget>("w1").unwrap().is_none());
  }

  fn query_roundtrip(storage: &impl CacheStorage) {
    let list = vec![widget("a", "A"), widget("b", "B")];
    storage.store_query_result("q1", &list).unwrap();

    let cached = storage.get_query_result::<Widget>("q1").unwrap().unwrap();
    assert_eq!(cached.entities, list);

    // Entities are shared with the entity table
    let one = storage.get_entity::<Widget>("a").unwrap().unwrap();
    assert_eq!(one.entity.name, "A");

    // Replacing the query replaces the member list
    storage.store_query_result("q1", &[widget("c", "C")]).unwrap();
    let cached = storage.get_query_result::<Widget>("q1").unwrap().unwrap();
    assert_eq!(cached.entities.len(), 1);
    assert_eq!(cached.entities[0].id, "c");

    storage.remove_query("q1").unwrap();
    assert!(storage.get_query_result::<Widget>("q1").unwrap().is_none());
  }

  fn invalidate_by_type(storage: &impl CacheStorage) {
    storage.store_query_result("q1", &[widget("a", "A")]).unwrap();
    storage.store_query_result("q2", &[widget("b", "B")]).unwrap();

    storage.remove_queries_for("widget").unwrap();
    assert!(storage.get_query_result::<Widget>("q1").unwrap().is_none());
    assert!(storage.get_query_result::<Widget>("q2").unwrap().is_none());

    // Entities stay; only list memberships are dropped
    assert!(storage.get_entity::<Widget>("a").unwrap().is_some());
  }

  #[test]
  fn test_memory_storage() {
    let storage = MemoryStorage::new();
    roundtrip(&storage);
    query_roundtrip(&storage);
    invalidate_by_type(&storage);
  }

  #[test]
  fn test_sqlite_storage() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    roundtrip(&storage);
    query_roundtrip(&storage);
    invalidate_by_type(&storage);
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.store_entity(&widget("w1", "first")).unwrap();
    assert!(storage.get_entity::<Widget>("w1").unwrap().is_none());
    storage.store_query_result("q", &[widget("a", "A")]).unwrap();
    assert!(storage.get_query_result::<Widget>("q").unwrap().is_none());
  }

  #[test]
  fn test_storage_from_config_defaults_to_memory() {
    let storage = Storage::from_config(&CacheConfig::default()).unwrap();
    assert!(matches!(storage, Storage::Memory(_)));
  }
}
