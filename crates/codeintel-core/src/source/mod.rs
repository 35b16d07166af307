//! Source providers
//!
//! A provider turns a source reference (local path or remote URL) into a
//! snapshot: the checkout root plus the files worth ingesting. Failure here
//! is the only thing that fails a whole ingestion task.

mod git;
mod local;
mod walk;

pub use git::GitSourceProvider;
pub use local::{read_git_head, LocalSourceProvider};
pub use walk::{has_binary_extension, relative_path, scan_repository, sniff_binary};

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One enumerated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub absolute_path: PathBuf,
    /// Forward-slash path relative to the snapshot root
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Files of one repository revision, ready for ingestion
#[derive(Debug)]
pub struct SourceSnapshot {
    /// Directory the files live under (a temporary checkout for remotes)
    pub root: PathBuf,
    /// Reference recorded on resources: the canonical path or the URL
    pub repository_root: String,
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub files: Vec<FileRef>,
    /// Keeps a temporary checkout alive until the snapshot is dropped
    pub(crate) checkout: Option<Arc<CheckoutGuard>>,
}

impl SourceSnapshot {
    pub fn new(root: PathBuf, repository_root: String, files: Vec<FileRef>) -> Self {
        Self {
            root,
            repository_root,
            commit_hash: None,
            branch: None,
            files,
            checkout: None,
        }
    }

    pub fn with_revision(mut self, commit_hash: Option<String>, branch: Option<String>) -> Self {
        self.commit_hash = commit_hash;
        self.branch = branch;
        self
    }
}

/// Removes a temporary checkout directory on drop
#[derive(Debug)]
pub struct CheckoutGuard {
    path: PathBuf,
}

impl CheckoutGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove checkout");
            }
        }
    }
}

/// Enumerates the files of a repository
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Provider type identifier ("local", "git")
    fn provider_type(&self) -> &'static str;

    /// Whether this provider handles `source_ref`
    fn accepts(&self, source_ref: &str) -> bool;

    /// Enumerate files, honouring ignore rules and skipping binaries
    async fn enumerate_files(
        &self,
        source_ref: &str,
        branch: Option<&str>,
    ) -> Result<SourceSnapshot>;
}

/// Whether a source reference names a remote repository
pub fn is_remote(source_ref: &str) -> bool {
    const SCHEMES: &[&str] = &["http://", "https://", "ssh://", "git://", "git@", "file://"];
    SCHEMES.iter().any(|s| source_ref.starts_with(s))
}

/// Routes a source reference to the first provider accepting it
pub struct RepositorySource {
    providers: Vec<Arc<dyn SourceProvider>>,
}

impl RepositorySource {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Git provider for URLs, local provider for everything else
    pub fn with_defaults(config: &SourceConfig) -> Self {
        let mut source = Self::new();
        source.register(Arc::new(GitSourceProvider::new(config.clone())));
        source.register(Arc::new(LocalSourceProvider::new(config.clone())));
        source
    }

    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        self.providers.push(provider);
    }
}

impl Default for RepositorySource {
    fn default() -> Self {
        Self::with_defaults(&SourceConfig::default())
    }
}

#[async_trait::async_trait]
impl SourceProvider for RepositorySource {
    fn provider_type(&self) -> &'static str {
        "repository"
    }

    fn accepts(&self, source_ref: &str) -> bool {
        self.providers.iter().any(|p| p.accepts(source_ref))
    }

    async fn enumerate_files(
        &self,
        source_ref: &str,
        branch: Option<&str>,
    ) -> Result<SourceSnapshot> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.accepts(source_ref))
            .ok_or_else(|| Error::Source(format!("No provider accepts '{}'", source_ref)))?;
        tracing::debug!(
            source = %source_ref,
            provider = provider.provider_type(),
            "Enumerating source"
        );
        provider.enumerate_files(source_ref, branch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://github.com/org/repo.git"));
        assert!(is_remote("git@github.com:org/repo.git"));
        assert!(is_remote("file:///srv/repo.git"));
        assert!(!is_remote("/home/me/repo"));
        assert!(!is_remote("./repo"));
    }

    #[test]
    fn test_routing() {
        let source = RepositorySource::default();
        assert!(source.accepts("https://example.com/r.git"));
        assert!(source.accepts("/tmp"));
    }

    #[test]
    fn test_checkout_guard_removes_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let checkout = dir.path().join("clone");
        std::fs::create_dir_all(checkout.join("src")).unwrap();
        drop(CheckoutGuard::new(checkout.clone()));
        assert!(!checkout.exists());
    }
}
