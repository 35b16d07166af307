//! SQLite-backed store

use super::IngestionStore;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{CodeChunk, GraphTriple, Resource};
use std::path::Path;
use std::sync::Arc;

/// Store writing through a shared [`Database`]
///
/// SQLite calls run on the blocking pool so file workers never stall the
/// runtime.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open and initialize a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| Error::Persist(format!("store task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl IngestionStore for SqliteStore {
    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let resource = resource.clone();
        self.run(move |db| db.upsert_resource(&resource)).await
    }

    async fn save_chunks(&self, resource_id: &str, chunks: &[CodeChunk]) -> Result<()> {
        let resource_id = resource_id.to_string();
        let chunks = chunks.to_vec();
        self.run(move |db| db.replace_chunks(&resource_id, &chunks))
            .await
    }

    async fn save_triples(&self, resource_id: &str, triples: &[GraphTriple]) -> Result<()> {
        let resource_id = resource_id.to_string();
        let triples = triples.to_vec();
        self.run(move |db| db.replace_triples(&resource_id, &triples))
            .await
    }

    async fn save_file(
        &self,
        resource: &Resource,
        chunks: &[CodeChunk],
        triples: &[GraphTriple],
    ) -> Result<()> {
        let resource = resource.clone();
        let chunks = chunks.to_vec();
        let triples = triples.to_vec();
        self.run(move |db| db.save_file(&resource, &chunks, &triples))
            .await
    }

    async fn mark_failed(&self, resource: &Resource) -> Result<()> {
        let resource = resource.clone();
        self.run(move |db| db.update_resource_status(&resource)).await
    }
}
