//! Persistence interface for ingestion results
//!
//! Every save is idempotent on id. Chunks and triples are saved per
//! resource, replacing whatever that resource had before. The pipeline
//! writes a file through [`IngestionStore::save_file`], which stores that
//! implement atomically keep all-or-nothing.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{CodeChunk, GraphTriple, Resource};

#[async_trait::async_trait]
pub trait IngestionStore: Send + Sync {
    async fn save_resource(&self, resource: &Resource) -> Result<()>;

    async fn save_chunks(&self, resource_id: &str, chunks: &[CodeChunk]) -> Result<()>;

    async fn save_triples(&self, resource_id: &str, triples: &[GraphTriple]) -> Result<()>;

    /// Write one file's results together
    ///
    /// The resource goes last, so its status only changes once the chunks
    /// and triples are in.
    async fn save_file(
        &self,
        resource: &Resource,
        chunks: &[CodeChunk],
        triples: &[GraphTriple],
    ) -> Result<()> {
        self.save_chunks(&resource.id, chunks).await?;
        self.save_triples(&resource.id, triples).await?;
        self.save_resource(resource).await
    }

    /// Record a failed ingestion without touching previously stored results
    async fn mark_failed(&self, resource: &Resource) -> Result<()> {
        self.save_resource(resource).await
    }
}
