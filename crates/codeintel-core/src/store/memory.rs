//! In-memory store

use super::IngestionStore;
use crate::error::{Error, Result};
use crate::types::{CodeChunk, GraphTriple, Resource};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    resources: HashMap<String, Resource>,
    chunks: HashMap<String, Vec<CodeChunk>>,
    triples: HashMap<String, Vec<GraphTriple>>,
}

/// Store keeping everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Persist("memory store lock poisoned".to_string()))
    }

    pub fn resource(&self, id: &str) -> Option<Resource> {
        self.tables().ok()?.resources.get(id).cloned()
    }

    pub fn resource_by_path(&self, relative_path: &str) -> Option<Resource> {
        self.tables()
            .ok()?
            .resources
            .values()
            .find(|r| r.relative_path == relative_path)
            .cloned()
    }

    /// All resources, ordered by path
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self
            .tables()
            .map(|t| t.resources.values().cloned().collect())
            .unwrap_or_default();
        resources.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        resources
    }

    pub fn chunks_for(&self, resource_id: &str) -> Vec<CodeChunk> {
        self.tables()
            .ok()
            .and_then(|t| t.chunks.get(resource_id).cloned())
            .unwrap_or_default()
    }

    pub fn triples_for(&self, resource_id: &str) -> Vec<GraphTriple> {
        self.tables()
            .ok()
            .and_then(|t| t.triples.get(resource_id).cloned())
            .unwrap_or_default()
    }

    pub fn chunk_count(&self) -> usize {
        self.tables()
            .map(|t| t.chunks.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn triple_count(&self) -> usize {
        self.tables()
            .map(|t| t.triples.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Keep the last occurrence of each id, preserving first-seen order
fn dedup_by_id<T: Clone>(items: &[T], id: impl Fn(&T) -> String) -> Vec<T> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, T> = HashMap::new();
    for item in items {
        let key = id(item);
        if latest.insert(key.clone(), item.clone()).is_none() {
            order.push(key);
        }
    }
    order
        .into_iter()
        .filter_map(|key| latest.remove(&key))
        .collect()
}

#[async_trait::async_trait]
impl IngestionStore for MemoryStore {
    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        self.tables()?
            .resources
            .insert(resource.id.clone(), resource.clone());
        Ok(())
    }

    async fn save_chunks(&self, resource_id: &str, chunks: &[CodeChunk]) -> Result<()> {
        let chunks = dedup_by_id(chunks, |c| c.id.clone());
        self.tables()?.chunks.insert(resource_id.to_string(), chunks);
        Ok(())
    }

    async fn save_triples(&self, resource_id: &str, triples: &[GraphTriple]) -> Result<()> {
        let triples = dedup_by_id(triples, GraphTriple::id);
        self.tables()?
            .triples
            .insert(resource_id.to_string(), triples);
        Ok(())
    }

    async fn save_file(
        &self,
        resource: &Resource,
        chunks: &[CodeChunk],
        triples: &[GraphTriple],
    ) -> Result<()> {
        let chunks = dedup_by_id(chunks, |c| c.id.clone());
        let triples = dedup_by_id(triples, GraphTriple::id);
        let mut tables = self.tables()?;
        tables.chunks.insert(resource.id.clone(), chunks);
        tables.triples.insert(resource.id.clone(), triples);
        tables.resources.insert(resource.id.clone(), resource.clone());
        Ok(())
    }

    async fn mark_failed(&self, resource: &Resource) -> Result<()> {
        self.tables()?
            .resources
            .entry(resource.id.clone())
            .and_modify(|stored| stored.ingestion_status = resource.ingestion_status)
            .or_insert_with(|| resource.clone());
        Ok(())
    }
}
