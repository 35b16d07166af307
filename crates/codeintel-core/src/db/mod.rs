//! SQLite storage for ingested resources, chunks and triples

mod chunks;
mod resources;
mod schema;
mod triples;

pub use schema::Database;

use crate::error::Result;
use crate::types::{CodeChunk, GraphTriple, Resource};
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }

    /// Write one file's resource, chunks and triples in a single transaction
    ///
    /// Either everything lands or the previous rows stay as they were.
    pub fn save_file(
        &self,
        resource: &Resource,
        chunks: &[CodeChunk],
        triples: &[GraphTriple],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        resources::write_resource(&tx, resource)?;
        chunks::write_chunks(&tx, &resource.id, chunks)?;
        triples::write_triples(&tx, &resource.id, triples)?;
        tx.commit()?;
        Ok(())
    }
}
