//! Codeintel Core Library
//!
//! Repository ingestion for code intelligence: files are classified,
//! split into AST-aligned chunks and mined for a static code graph.
//!
//! # Features
//! - Rule-based classification into THEORY, PRACTICE and GOVERNANCE
//! - Tree-sitter parsing for Rust, Python, JavaScript, TypeScript and Go
//! - Chunking aligned to functions, methods and types under a token budget
//! - IMPORTS, DEFINES and CALLS triples with resolution confidence
//! - Concurrent, batched ingestion tasks with progress and cancellation

pub mod chunk;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod graph;
pub mod parse;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod types;

pub use chunk::{estimate_tokens, ChunkBuild, ChunkBuilder};
pub use classify::{Classifier, ClassifierRule};
pub use config::Config;
pub use db::Database;
pub use error::{CodeIntelError, Error, Result};
pub use events::{ChannelEventSink, Event, EventSink, LogEventSink};
pub use graph::{Extraction, GraphExtractor};
pub use parse::{ParserFactory, ParserLookup, ParserRegistry, SourceParser, SyntaxTree};
pub use pipeline::{FileOutcome, Orchestrator, OrchestratorBuilder};
pub use source::{
    FileRef, GitSourceProvider, LocalSourceProvider, RepositorySource, SourceProvider,
    SourceSnapshot,
};
pub use store::{IngestionStore, MemoryStore, SqliteStore};
pub use types::{
    ChunkType, Classification, CodeChunk, GraphTriple, IngestionTaskView, Predicate, Resource,
    ResourceStatus, TaskStatus,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "codeintel";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "codeintel";
