//! Configuration management

use crate::classify::{default_rules, ClassifierRule};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Token budget for a single chunk
pub const MAX_CHUNK_TOKENS: usize = 2000;

/// Files per scheduling batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Simultaneously processing tasks
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 3;

/// Directories never descended into by the local source provider
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".cache",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "target",
    ".tox",
    ".mypy_cache",
    ".gradle",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Scheduler limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Tasks allowed in PROCESSING at once
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// PENDING tasks allowed before submissions are rejected
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,

    /// Files per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// File workers per task
    #[serde(default = "default_file_workers")]
    pub file_workers: usize,

    /// Terminal tasks kept in the registry before the oldest are evicted
    #[serde(default = "default_max_retained_tasks")]
    pub max_retained_tasks: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: env_usize("CODEINTEL_MAX_TASKS")
                .unwrap_or_else(default_max_concurrent_tasks),
            max_queue_depth: default_max_queue_depth(),
            batch_size: env_usize("CODEINTEL_BATCH_SIZE").unwrap_or_else(default_batch_size),
            file_workers: env_usize("CODEINTEL_WORKERS").unwrap_or_else(default_file_workers),
            max_retained_tasks: default_max_retained_tasks(),
        }
    }
}

fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

fn default_max_queue_depth() -> usize {
    64
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_file_workers() -> usize {
    4
}

fn default_max_retained_tasks() -> usize {
    256
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Chunk builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    /// Line count of one fallback window
    #[serde(default = "default_fallback_window_lines")]
    pub fallback_window_lines: usize,

    /// Per-file parse budget; exceeding it triggers fallback chunking
    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: default_max_chunk_tokens(),
            fallback_window_lines: default_fallback_window_lines(),
            parse_timeout_ms: default_parse_timeout_ms(),
        }
    }
}

fn default_max_chunk_tokens() -> usize {
    MAX_CHUNK_TOKENS
}

fn default_fallback_window_lines() -> usize {
    80
}

fn default_parse_timeout_ms() -> u64 {
    5000
}

/// Local source provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    /// Larger files are skipped during enumeration
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Parent directory for shallow clones (system temp dir if unset)
    #[serde(default)]
    pub clone_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            exclude_hidden: true,
            max_file_bytes: default_max_file_bytes(),
            clone_dir: None,
        }
    }
}

fn default_exclude_dirs() -> Vec<String> {
    DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

/// Classifier rule table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<ClassifierRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl Config {
    /// Load config from `CODEINTEL_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("CODEINTEL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific file, defaults when it does not exist
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject limits the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("pipeline.max_concurrent_tasks", self.pipeline.max_concurrent_tasks),
            ("pipeline.max_queue_depth", self.pipeline.max_queue_depth),
            ("pipeline.batch_size", self.pipeline.batch_size),
            ("pipeline.file_workers", self.pipeline.file_workers),
            ("chunking.max_chunk_tokens", self.chunking.max_chunk_tokens),
            ("chunking.fallback_window_lines", self.chunking.fallback_window_lines),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }
        // tree-sitter treats a zero timeout as no timeout at all
        if self.chunking.parse_timeout_ms == 0 {
            return Err(Error::Config(
                "chunking.parse_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
