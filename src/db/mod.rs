mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::models::FeatureCollection;

/// Durable local cache of feature collections, keyed by application key.
///
/// Every constructor leaves the `feature_cache` schema in place.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_schema(conn)
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self> {
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Poisoning is ignored: each statement is atomic on its own.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================
    // Feature cache operations
    // ============================================================

    pub fn read_collection(&self, key: &str) -> Result<Option<FeatureCollection>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT collection FROM feature_cache WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => {
                let collection = FeatureCollection::from_json(&json)
                    .with_context(|| format!("Cached collection {:?} is corrupt", key))?;
                Ok(Some(collection))
            }
            None => Ok(None),
        }
    }

    pub fn write_collection(&self, key: &str, collection: &FeatureCollection) -> Result<()> {
        let json = collection.to_json()?;
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO feature_cache (key, collection, feature_count, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                collection = excluded.collection,
                feature_count = excluded.feature_count,
                updated_at = excluded.updated_at",
            (key, &json, collection.len() as i64, now.to_rfc3339()),
        )?;

        Ok(())
    }

    pub fn delete_collection(&self, key: &str) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM feature_cache WHERE key = ?", [key])?;
        Ok(rows > 0)
    }

    /// When the cached collection under `key` was last written.
    pub fn cached_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let updated_at: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM feature_cache WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at.map(parse_datetime))
    }
}

/// Default database location under the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "cartoquartier")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("cartoquartier.db"))
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
