//! CLI command handlers

pub mod chunks;
pub mod classify;
pub mod graph;
pub mod ingest;
pub mod languages;

use anyhow::{Context, Result};
use codeintel_core::classify::SNIFF_BYTES;
use codeintel_core::parse::ParserLookup;
use codeintel_core::source::relative_path;
use codeintel_core::types::UNKNOWN_LANGUAGE;
use codeintel_core::{Classifier, Config, ParserRegistry, Resource, SourceParser};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One file loaded for a single-component command
pub struct LoadedFile {
    pub resource: Resource,
    pub content: String,
    pub parser: Option<Box<dyn SourceParser>>,
}

pub fn parser_registry(config: &Config) -> ParserRegistry {
    ParserRegistry::with_defaults(Duration::from_millis(config.chunking.parse_timeout_ms))
}

/// Canonical working directory, when it can be resolved
pub fn current_dir() -> Option<PathBuf> {
    std::env::current_dir()
        .and_then(std::fs::canonicalize)
        .ok()
}

/// Path given to the classifier: relative to `cwd` when below it, absolute otherwise
pub fn classification_path(absolute: &Path, cwd: Option<&Path>) -> String {
    match cwd {
        Some(cwd) if absolute.starts_with(cwd) => relative_path(cwd, absolute),
        _ => absolute.to_string_lossy().replace('\\', "/"),
    }
}

/// Read, classify and route one file the way the pipeline would
pub fn load_file(path: &Path, config: &Config) -> Result<LoadedFile> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let bytes = std::fs::read(&absolute)
        .with_context(|| format!("Cannot read {}", absolute.display()))?;

    let root = absolute
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let classifier = Classifier::new(&config.classifier.rules)?;
    let classification = classifier.classify(
        &classification_path(&absolute, current_dir().as_deref()),
        &bytes[..bytes.len().min(SNIFF_BYTES)],
    );

    let registry = parser_registry(config);
    let language = registry
        .language_for_path(&absolute)
        .unwrap_or(UNKNOWN_LANGUAGE)
        .to_string();
    let parser = match registry.get_parser(&language)? {
        ParserLookup::Available(parser) => Some(parser),
        ParserLookup::Unsupported => None,
    };

    let resource = Resource::new(&root, &name, classification, &language).with_content(&bytes);
    let content = String::from_utf8_lossy(&bytes).into_owned();

    Ok(LoadedFile {
        resource,
        content,
        parser,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_path_below_cwd() {
        let path = classification_path(
            Path::new("/work/repo/papers/notes.md"),
            Some(Path::new("/work/repo")),
        );
        assert_eq!(path, "papers/notes.md");
    }

    #[test]
    fn test_classification_path_outside_cwd() {
        let path = classification_path(
            Path::new("/data/papers/notes.md"),
            Some(Path::new("/work/repo")),
        );
        assert_eq!(path, "/data/papers/notes.md");
        assert_eq!(
            classification_path(Path::new("/data/LICENSE"), None),
            "/data/LICENSE"
        );
    }
}
