//! Per-file ingestion: classify, chunk, extract, persist

use crate::chunk::ChunkBuilder;
use crate::classify::{Classifier, SNIFF_BYTES};
use crate::error::{Error, Result};
use crate::events::{self, EventSink};
use crate::graph::GraphExtractor;
use crate::parse::{ParserLookup, ParserRegistry, SourceParser};
use crate::source::FileRef;
use crate::store::IngestionStore;
use crate::types::{CodeChunk, GraphTriple, Resource, ResourceStatus, UNKNOWN_LANGUAGE};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Revision data shared by every file of one task
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: String,
    pub repository_root: String,
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
}

/// Result of one file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Ingested {
        path: String,
        chunks: usize,
        triples: usize,
        fallback: bool,
    },
    /// Unreadable or not persisted; counted as processed
    Failed { path: String, error: String },
    /// Not started because the task was cancelled
    Skipped { path: String },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Ingested { path, .. } | Self::Failed { path, .. } | Self::Skipped { path } => {
                path
            }
        }
    }
}

/// Parsers owned by one worker, one per language
#[derive(Default)]
pub struct ParserCache {
    parsers: HashMap<String, Box<dyn SourceParser>>,
}

impl ParserCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn take(&mut self, language: &str) -> Option<Box<dyn SourceParser>> {
        self.parsers.remove(language)
    }

    fn put(&mut self, language: &str, parser: Box<dyn SourceParser>) {
        self.parsers.insert(language.to_string(), parser);
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

/// Everything computed for one file before persistence
struct Analysis {
    resource: Resource,
    chunks: Vec<CodeChunk>,
    triples: Vec<GraphTriple>,
    fallback: bool,
}

/// Stateless per-file pipeline shared by every worker
pub struct FileProcessor {
    classifier: Classifier,
    registry: ParserRegistry,
    chunker: ChunkBuilder,
    extractor: GraphExtractor,
    store: Arc<dyn IngestionStore>,
    events: Arc<dyn EventSink>,
}

impl FileProcessor {
    pub fn new(
        classifier: Classifier,
        registry: ParserRegistry,
        chunker: ChunkBuilder,
        store: Arc<dyn IngestionStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            classifier,
            registry,
            chunker,
            extractor: GraphExtractor::new(),
            store,
            events,
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub(crate) fn emit(&self, event: &str, payload: serde_json::Value) {
        if let Err(e) = self.events.emit(event, payload) {
            tracing::warn!(event, error = %e, "Event emission failed");
        }
    }

    /// Run one file through the pipeline; never fails the task
    pub async fn process(
        self: &Arc<Self>,
        ctx: &TaskContext,
        file: &FileRef,
        cache: &mut ParserCache,
    ) -> FileOutcome {
        let path = file.relative_path.clone();

        let bytes = match tokio::fs::read(&file.absolute_path).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(ctx, &path, &Error::Io(e)),
        };

        let analysis = match self.analyze(ctx, file, bytes, cache).await {
            Ok(analysis) => analysis,
            Err(e) => return self.fail(ctx, &path, &e),
        };

        let Analysis {
            mut resource,
            chunks,
            triples,
            fallback,
        } = analysis;

        if let Err(e) = self.persist(&mut resource, &chunks, &triples).await {
            self.discard(&mut resource).await;
            return self.fail(ctx, &path, &e);
        }

        self.emit(
            events::FILE_INGESTED,
            json!({
                "task_id": ctx.task_id,
                "path": path,
                "resource_id": resource.id,
                "classification": resource.classification,
                "language": resource.language,
                "chunks": chunks.len(),
                "triples": triples.len(),
                "fallback": fallback,
            }),
        );

        FileOutcome::Ingested {
            path,
            chunks: chunks.len(),
            triples: triples.len(),
            fallback,
        }
    }

    async fn analyze(
        self: &Arc<Self>,
        ctx: &TaskContext,
        file: &FileRef,
        bytes: Vec<u8>,
        cache: &mut ParserCache,
    ) -> Result<Analysis> {
        let path = file.relative_path.clone();
        let sniff = &bytes[..bytes.len().min(SNIFF_BYTES)];
        let classification = self.classifier.classify(&path, sniff);
        let language = self
            .registry
            .language_for_path(Path::new(&path))
            .unwrap_or(UNKNOWN_LANGUAGE)
            .to_string();

        let mut resource = Resource::new(&ctx.repository_root, &path, classification, &language)
            .with_revision(ctx.commit_hash.clone(), ctx.branch.clone())
            .with_content(&bytes);

        let parser = match cache.take(&language) {
            Some(parser) => Some(parser),
            None => match self.registry.get_parser(&language) {
                Ok(ParserLookup::Available(parser)) => Some(parser),
                Ok(ParserLookup::Unsupported) => None,
                Err(e) => {
                    tracing::warn!(path = %path, language = %language, error = %e, "Parser unavailable");
                    resource.add_warning(format!("parser unavailable, fallback chunking used: {}", e));
                    None
                }
            },
        };

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        let processor = Arc::clone(self);
        let (parser, resource, chunks, triples, fallback) =
            tokio::task::spawn_blocking(move || {
                let mut parser = parser;
                let mut resource = resource;
                let build = processor
                    .chunker
                    .build(&resource, parser.as_deref_mut(), &content);
                let extraction = processor.extractor.extract_with_diagnostics(
                    &resource,
                    build.tree.as_ref(),
                    &content,
                );
                resource.warnings.extend(build.warnings);
                if let Some(e) = extraction.error {
                    resource.add_warning(format!("graph extraction incomplete: {}", e));
                }
                let fallback = build.tree.is_none();
                (parser, resource, build.chunks, extraction.triples, fallback)
            })
            .await
            .map_err(|e| Error::Parse(format!("analysis of {} aborted: {}", path, e)))?;

        if let Some(parser) = parser {
            cache.put(&language, parser);
        }

        tracing::debug!(
            path = %path,
            language = %language,
            classification = %resource.classification,
            chunks = chunks.len(),
            triples = triples.len(),
            "Analyzed file"
        );

        Ok(Analysis {
            resource,
            chunks,
            triples,
            fallback,
        })
    }

    async fn persist(
        &self,
        resource: &mut Resource,
        chunks: &[CodeChunk],
        triples: &[GraphTriple],
    ) -> Result<()> {
        resource.ingestion_status = ResourceStatus::Completed;
        self.store.save_file(resource, chunks, triples).await
    }

    /// Best effort: mark the resource failed, keeping earlier results
    async fn discard(&self, resource: &mut Resource) {
        resource.ingestion_status = ResourceStatus::Failed;
        if let Err(e) = self.store.mark_failed(resource).await {
            tracing::warn!(
                path = %resource.relative_path,
                error = %e,
                "Could not record failed resource"
            );
        }
    }

    fn fail(&self, ctx: &TaskContext, path: &str, error: &Error) -> FileOutcome {
        tracing::warn!(task_id = %ctx.task_id, path = %path, error = %error, "File failed");
        self.emit(
            events::FILE_FAILED,
            json!({
                "task_id": ctx.task_id,
                "path": path,
                "error": error.to_string(),
            }),
        );
        FileOutcome::Failed {
            path: path.to_string(),
            error: error.to_string(),
        }
    }
}
