//! Database schema and initialization

use crate::error::{Error, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite handle shared by the store and the CLI
///
/// The connection sits behind a mutex so one handle can serve every file
/// worker; statements are short and never held across awaits.
pub struct Database {
    conn: Mutex<Connection>,
}

pub(crate) const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per ingested file
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    relative_path TEXT NOT NULL,
    repository_root TEXT NOT NULL,
    commit_hash TEXT,
    branch TEXT,
    classification TEXT NOT NULL,
    language TEXT NOT NULL,
    ingestion_status TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    warnings TEXT NOT NULL DEFAULT '[]',
    ingested_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    resource_id TEXT NOT NULL REFERENCES resources(id),
    seq INTEGER NOT NULL,
    chunk_type TEXT NOT NULL,
    function_name TEXT,
    class_name TEXT,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    language TEXT NOT NULL,
    token_count INTEGER NOT NULL,
    is_fallback INTEGER NOT NULL,
    oversized INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    content TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS triples (
    id TEXT PRIMARY KEY,
    resource_id TEXT NOT NULL REFERENCES resources(id),
    subject TEXT NOT NULL,
    predicate TEXT NOT NULL,
    object TEXT NOT NULL,
    source_file TEXT NOT NULL,
    target_symbol TEXT NOT NULL,
    line_number INTEGER NOT NULL,
    confidence REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resources_repo ON resources(repository_root, relative_path);
CREATE INDEX IF NOT EXISTS idx_chunks_resource ON chunks(resource_id, seq);
CREATE INDEX IF NOT EXISTS idx_triples_resource ON triples(resource_id, line_number);
CREATE INDEX IF NOT EXISTS idx_triples_predicate ON triples(predicate, object);
"#;

impl Database {
    /// Open database at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Persist("database connection lock poisoned".to_string()))
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(CREATE_TABLES)?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let conn = self.conn()?;
        let version = conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        assert_eq!(db.schema_version().unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_initialize_is_repeatable() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.initialize().unwrap();
        assert_eq!(db.schema_version().unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/codeintel.sqlite");
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        assert!(path.exists());
    }
}
