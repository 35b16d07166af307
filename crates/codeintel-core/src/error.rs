//! Error types for codeintel

use thiserror::Error;

/// Result type alias using CodeIntelError
pub type Result<T> = std::result::Result<T, CodeIntelError>;

/// Error type alias for convenience
pub type Error = CodeIntelError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const CAPACITY: i32 = 4;
    pub const SOURCE_FAILED: i32 = 5;
}

/// Main error type for codeintel
#[derive(Debug, Error)]
pub enum CodeIntelError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Parse timed out after {0} ms")]
    ParseTimeout(u64),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Clone failed for {url}: {message}")]
    Clone { url: String, message: String },

    #[error("Persistence error: {0}")]
    Persist(String),

    #[error("Ingestion capacity exhausted: {pending} tasks already queued (max {max})")]
    Capacity { pending: usize, max: usize },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task state: {0}")]
    InvalidTaskState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CodeIntelError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TaskNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) | Self::GlobPattern(_) => {
                exit_codes::INVALID_INPUT
            }
            Self::Capacity { .. } => exit_codes::CAPACITY,
            Self::Source(_) | Self::Clone { .. } => exit_codes::SOURCE_FAILED,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CodeIntelError::TaskNotFound("x".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            CodeIntelError::Capacity { pending: 4, max: 4 }.exit_code(),
            exit_codes::CAPACITY
        );
        assert_eq!(
            CodeIntelError::Clone {
                url: "https://example.com/r.git".into(),
                message: "exit 128".into()
            }
            .exit_code(),
            exit_codes::SOURCE_FAILED
        );
        assert_eq!(
            CodeIntelError::Parse("bad".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }
}
