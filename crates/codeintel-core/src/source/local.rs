//! Local directory provider

use super::{is_remote, scan_repository, SourceProvider, SourceSnapshot};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Enumerates a directory on the local filesystem
pub struct LocalSourceProvider {
    config: SourceConfig,
}

impl LocalSourceProvider {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl Default for LocalSourceProvider {
    fn default() -> Self {
        Self::new(SourceConfig::default())
    }
}

#[async_trait::async_trait]
impl SourceProvider for LocalSourceProvider {
    fn provider_type(&self) -> &'static str {
        "local"
    }

    fn accepts(&self, source_ref: &str) -> bool {
        !is_remote(source_ref)
    }

    async fn enumerate_files(
        &self,
        source_ref: &str,
        branch: Option<&str>,
    ) -> Result<SourceSnapshot> {
        let root = tokio::fs::canonicalize(source_ref)
            .await
            .map_err(|e| Error::Source(format!("Cannot access '{}': {}", source_ref, e)))?;
        if !root.is_dir() {
            return Err(Error::Source(format!(
                "'{}' is not a directory",
                root.display()
            )));
        }

        let scan_root = root.clone();
        let config = self.config.clone();
        let files = tokio::task::spawn_blocking(move || scan_repository(&scan_root, &config))
            .await
            .map_err(|e| Error::Source(format!("Enumeration task failed: {}", e)))?
            .map_err(|e| Error::Source(format!("Enumerating '{}': {}", root.display(), e)))?;

        let (commit_hash, detected_branch) = read_git_head(&root);
        if let (Some(requested), Some(current)) = (branch, detected_branch.as_deref()) {
            if requested != current {
                tracing::warn!(
                    path = %root.display(),
                    requested,
                    current,
                    "Local checkout is on a different branch; ingesting working tree as is"
                );
            }
        }

        tracing::info!(
            path = %root.display(),
            files = files.len(),
            commit = commit_hash.as_deref().unwrap_or("-"),
            "Enumerated local source"
        );

        let repository_root = root.to_string_lossy().to_string();
        Ok(SourceSnapshot::new(root, repository_root, files).with_revision(
            commit_hash,
            branch.map(str::to_string).or(detected_branch),
        ))
    }
}

/// Commit hash and branch of a checkout, read straight from `.git`
pub fn read_git_head(root: &Path) -> (Option<String>, Option<String>) {
    let Some(git_dir) = git_dir(root) else {
        return (None, None);
    };
    let Ok(head) = std::fs::read_to_string(git_dir.join("HEAD")) else {
        return (None, None);
    };
    let head = head.trim();

    match head.strip_prefix("ref:") {
        Some(reference) => {
            let reference = reference.trim();
            let branch = reference
                .strip_prefix("refs/heads/")
                .unwrap_or(reference)
                .to_string();
            (resolve_ref(&git_dir, reference), Some(branch))
        }
        None if !head.is_empty() => (Some(head.to_string()), None),
        None => (None, None),
    }
}

/// `.git` directory, following the `gitdir:` file used by worktrees
fn git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    let pointer = std::fs::read_to_string(&dot_git).ok()?;
    let target = pointer.trim().strip_prefix("gitdir:")?.trim();
    let path = PathBuf::from(target);
    Some(if path.is_absolute() { path } else { root.join(path) })
}

fn resolve_ref(git_dir: &Path, reference: &str) -> Option<String> {
    if let Ok(hash) = std::fs::read_to_string(git_dir.join(reference)) {
        let hash = hash.trim();
        if !hash.is_empty() {
            return Some(hash.to_string());
        }
    }
    let packed = std::fs::read_to_string(git_dir.join("packed-refs")).ok()?;
    packed
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
        .find_map(|line| {
            let (hash, name) = line.split_once(' ')?;
            (name.trim() == reference).then(|| hash.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_read_head_from_loose_ref() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(git.join("refs/heads")).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(git.join("refs/heads/main"), format!("{}\n", HASH)).unwrap();

        let (commit, branch) = read_git_head(dir.path());
        assert_eq!(commit.as_deref(), Some(HASH));
        assert_eq!(branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_read_head_from_packed_refs() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/dev\n").unwrap();
        fs::write(
            git.join("packed-refs"),
            format!("# pack-refs with: peeled\n{} refs/heads/dev\n", HASH),
        )
        .unwrap();

        assert_eq!(read_git_head(dir.path()).0.as_deref(), Some(HASH));
    }

    #[test]
    fn test_detached_head_and_no_repo() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_git_head(dir.path()), (None, None));

        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), HASH).unwrap();
        assert_eq!(read_git_head(dir.path()), (Some(HASH.to_string()), None));
    }

    #[tokio::test]
    async fn test_enumerate_local_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/gen.py"), "x = 1\n").unwrap();

        let snapshot = LocalSourceProvider::default()
            .enumerate_files(dir.path().to_str().unwrap(), Some("feature"))
            .await
            .unwrap();
        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].relative_path, "main.py");
        assert_eq!(snapshot.branch.as_deref(), Some("feature"));
        assert!(snapshot.checkout.is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_is_source_error() {
        let err = LocalSourceProvider::default()
            .enumerate_files("/definitely/not/here", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }
}
