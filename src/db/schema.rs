//! Cache schema, versioned through SQLite's `user_version` pragma.

use anyhow::{Context, Result};
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

const FEATURE_CACHE: &str = include_str!("feature_cache.sql");

/// Create the `feature_cache` table on a fresh database. A database written by
/// a newer build is refused rather than read with the wrong layout.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read cache schema version")?;

    match version {
        SCHEMA_VERSION => Ok(()),
        0 => {
            conn.execute_batch(FEATURE_CACHE)
                .context("Failed to create feature_cache table")?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tracing::info!(version = SCHEMA_VERSION, "Created feature cache schema");
            Ok(())
        }
        other => anyhow::bail!(
            "Unsupported cache schema version {} (expected {})",
            other,
            SCHEMA_VERSION
        ),
    }
}
