//! SQLite-backed key-value store for the timer record.
//!
//! This is the only on-disk artifact the caching core owns; it exists
//! because the UI may be relaunched while a remote timer keeps
//! running, and the elapsed display must survive the restart.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};

/// Schema for the kv table.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS interval_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

#[derive(Clone)]
pub struct TimerStore {
  conn: Arc<Mutex<Connection>>,
}

impl TimerStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| Error::Store(format!("failed to create data directory: {e}")))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| Error::Store(format!("failed to open {}: {}", path.display(), e)))?;
    Self::from_connection(conn)
  }

  /// In-memory store for tests; contents do not survive the handle.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| Error::Store("could not determine data directory".into()))?;
    Ok(data_dir.join("m9s").join("timer.db"))
  }

  pub fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock();
    let value = conn
      .query_row(
        "SELECT value FROM interval_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  pub fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock();
    conn.execute(
      "INSERT OR REPLACE INTO interval_cache (key, value) VALUES (?, ?)",
      params![key, value],
    )?;
    Ok(())
  }

  pub fn remove(&self, key: &str) -> Result<()> {
    let conn = self.lock();
    conn.execute("DELETE FROM interval_cache WHERE key = ?", params![key])?;
    Ok(())
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
    self.conn.lock().expect("timer store lock poisoned")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_get_remove_roundtrip() {
    let store = TimerStore::open_in_memory().unwrap();
    assert_eq!(store.get("current-interval").unwrap(), None);

    store.set("current-interval", "100").unwrap();
    assert_eq!(store.get("current-interval").unwrap(), Some("100".into()));

    store.set("current-interval", "101").unwrap();
    assert_eq!(store.get("current-interval").unwrap(), Some("101".into()));

    store.remove("current-interval").unwrap();
    assert_eq!(store.get("current-interval").unwrap(), None);
  }

  #[test]
  fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.db");

    {
      let store = TimerStore::open_at(&path).unwrap();
      store.set("last-check-timestamp", "1700000000000").unwrap();
    }

    let reopened = TimerStore::open_at(&path).unwrap();
    assert_eq!(
      reopened.get("last-check-timestamp").unwrap(),
      Some("1700000000000".into())
    );
  }
}
