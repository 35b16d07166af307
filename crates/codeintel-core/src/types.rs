//! Core record types produced by the ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language id recorded for files no registered grammar claims
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Coarse category assigned to every ingested file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Theory,
    Practice,
    Governance,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theory => "THEORY",
            Self::Practice => "PRACTICE",
            Self::Governance => "GOVERNANCE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file ingestion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    /// Classified, results not yet persisted
    Pending,
    /// Chunks and triples persisted
    Completed,
    /// Persisting this file's results failed
    Failed,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// One ingested file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub relative_path: String,
    /// Source reference as submitted (local path or remote URL)
    pub repository_root: String,
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub classification: Classification,
    pub language: String,
    pub ingestion_status: ResourceStatus,
    pub content_hash: String,
    pub size_bytes: u64,
    /// Non-fatal diagnostics (parse fallback, extraction cut short)
    pub warnings: Vec<String>,
    pub ingested_at: DateTime<Utc>,
}

impl Resource {
    /// Create a freshly classified resource in `Pending` state
    pub fn new(
        repository_root: &str,
        relative_path: &str,
        classification: Classification,
        language: &str,
    ) -> Self {
        Self {
            id: compute_resource_id(repository_root, relative_path),
            relative_path: relative_path.to_string(),
            repository_root: repository_root.to_string(),
            commit_hash: None,
            branch: None,
            classification,
            language: language.to_string(),
            ingestion_status: ResourceStatus::Pending,
            content_hash: String::new(),
            size_bytes: 0,
            warnings: Vec::new(),
            ingested_at: Utc::now(),
        }
    }

    pub fn with_revision(mut self, commit_hash: Option<String>, branch: Option<String>) -> Self {
        self.commit_hash = commit_hash;
        self.branch = branch;
        self
    }

    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.content_hash = compute_content_hash(content);
        self.size_bytes = content.len() as u64;
        self
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Type of a chunk's source region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    /// Source outside any logical unit (imports, top-level statements)
    Module,
    /// Line window produced without a syntax tree
    Text,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Module => "module",
            Self::Text => "text",
        }
    }
}

/// One stored slice of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub resource_id: String,
    /// Position within the resource, 0-based
    pub seq: usize,
    pub chunk_type: ChunkType,
    pub function_name: Option<String>,
    pub class_name: Option<String>,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    pub language: String,
    pub token_count: usize,
    pub is_fallback: bool,
    /// Atomic leaf that exceeds the token budget
    pub oversized: bool,
    pub content_hash: String,
    pub content: String,
}

/// Relationship kind of a graph triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    Imports,
    Defines,
    Calls,
}

impl Predicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imports => "IMPORTS",
            Self::Defines => "DEFINES",
            Self::Calls => "CALLS",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One static relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphTriple {
    pub resource_id: String,
    pub subject: String,
    pub predicate: Predicate,
    pub object: String,
    pub source_file: String,
    pub target_symbol: String,
    /// 1-indexed
    pub line_number: usize,
    /// 1.0 for unambiguous resolution, lower when the target is uncertain
    pub confidence: f32,
}

impl GraphTriple {
    /// Stable identity used for idempotent persistence
    pub fn id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.resource_id.as_str(),
            self.subject.as_str(),
            self.predicate.as_str(),
            self.object.as_str(),
            self.target_symbol.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&(self.line_number as u64).to_le_bytes());
        hasher.finalize().to_hex()[..32].to_string()
    }
}

/// Lifecycle state of an ingestion task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Allowed forward transitions; terminal states never move again
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one ingestion task, as returned by status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionTaskView {
    pub id: String,
    pub source_ref: String,
    pub branch: Option<String>,
    pub status: TaskStatus,
    pub files_processed: usize,
    pub total_files: usize,
    pub files_failed: usize,
    pub chunks_emitted: usize,
    pub triples_emitted: usize,
    pub current_file: Option<String>,
    pub error: Option<String>,
    pub retry_of: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Hash raw file content
pub fn compute_content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Deterministic resource id from repository reference and relative path
pub fn compute_resource_id(repository_root: &str, relative_path: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(repository_root.as_bytes());
    hasher.update(&[0]);
    hasher.update(relative_path.as_bytes());
    hasher.finalize().to_hex()[..32].to_string()
}

/// Deterministic chunk id over resource, line range and content
pub fn compute_chunk_id(
    resource_id: &str,
    start_line: usize,
    end_line: usize,
    content_hash: &str,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(resource_id.as_bytes());
    hasher.update(&(start_line as u64).to_le_bytes());
    hasher.update(&(end_line as u64).to_le_bytes());
    hasher.update(content_hash.as_bytes());
    hasher.finalize().to_hex()[..32].to_string()
}
