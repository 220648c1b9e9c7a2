//! Persistent cache trait and its backends.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Durable key to bytes store shared by every loader in the process.
///
/// Single-key reads and writes are atomic; callers need no extra locking.
pub trait PersistentCache: Send + Sync {
  /// Store bytes under a key, replacing whatever was there.
  fn put(&self, key: &str, value: &[u8]) -> Result<()>;

  /// Get the last bytes written under a key.
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

  /// When the entry under a key was written, if the backend tracks it.
  fn cached_at(&self, _key: &str) -> Result<Option<DateTime<Utc>>> {
    Ok(None)
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopCache;

impl PersistentCache for NoopCache {
  fn put(&self, _key: &str, _value: &[u8]) -> Result<()> {
    Ok(()) // Discard
  }

  fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
    Ok(None) // Always miss
  }
}

/// Process-lifetime cache kept in a map.
#[derive(Default)]
pub struct MemoryCache {
  entries: RwLock<HashMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }
}

impl PersistentCache for MemoryCache {
  fn put(&self, key: &str, value: &[u8]) -> Result<()> {
    let mut entries = self
      .entries
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), (value.to_vec(), Utc::now()));
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let entries = self
      .entries
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).map(|(data, _)| data.clone()))
  }

  fn cached_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
    let entries = self
      .entries
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).map(|(_, at)| *at))
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteCache {
  conn: Mutex<Connection>,
}

impl SqliteCache {
  /// Open the cache at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open (or create) the cache database at a specific path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    Ok(crate::config::data_dir()?.join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
-- Raw resource bytes keyed by <namespace>_<source id>
CREATE TABLE IF NOT EXISTS resource_cache (
    cache_key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl PersistentCache for SqliteCache {
  fn put(&self, key: &str, value: &[u8]) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO resource_cache (cache_key, data, cached_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to store cache entry {}: {}", key, e))?;

    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT data FROM resource_cache WHERE cache_key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))
  }

  fn cached_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let cached_at: Option<String> = conn
      .query_row(
        "SELECT cached_at FROM resource_cache WHERE cache_key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))?;

    cached_at.as_deref().map(parse_datetime).transpose()
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
