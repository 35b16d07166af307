//! Remote repositories via the `git` binary

use super::{is_remote, scan_repository, CheckoutGuard, SourceProvider, SourceSnapshot};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// Shallow-clones a remote into a temporary directory and enumerates it
pub struct GitSourceProvider {
    config: SourceConfig,
}

impl GitSourceProvider {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn checkout_dir(&self) -> PathBuf {
        let base = self
            .config
            .clone_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        base.join(format!("{}-clone-{}", crate::CACHE_DIR_NAME, uuid::Uuid::new_v4()))
    }
}

impl Default for GitSourceProvider {
    fn default() -> Self {
        Self::new(SourceConfig::default())
    }
}

async fn run_git(args: &[&str], cwd: Option<&Path>) -> std::result::Result<String, String> {
    let mut command = Command::new("git");
    command.args(args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command
        .output()
        .await
        .map_err(|e| format!("failed to run git: {}", e))?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

#[async_trait::async_trait]
impl SourceProvider for GitSourceProvider {
    fn provider_type(&self) -> &'static str {
        "git"
    }

    fn accepts(&self, source_ref: &str) -> bool {
        is_remote(source_ref)
    }

    async fn enumerate_files(
        &self,
        source_ref: &str,
        branch: Option<&str>,
    ) -> Result<SourceSnapshot> {
        let dir = self.checkout_dir();
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // removes the directory again on every early return below
        let guard = Arc::new(CheckoutGuard::new(dir.clone()));
        let dir_arg = dir.to_string_lossy().to_string();

        let mut args = vec!["clone", "--depth", "1", "--quiet"];
        if let Some(b) = branch {
            args.extend(["--branch", b]);
        }
        args.extend([source_ref, dir_arg.as_str()]);

        tracing::info!(url = %source_ref, branch = ?branch, "Cloning repository");
        run_git(&args, None).await.map_err(|message| Error::Clone {
            url: source_ref.to_string(),
            message,
        })?;

        let commit_hash = run_git(&["rev-parse", "HEAD"], Some(&dir)).await.ok();
        let detected_branch = run_git(&["rev-parse", "--abbrev-ref", "HEAD"], Some(&dir))
            .await
            .ok()
            .filter(|b| b != "HEAD");

        let scan_root = dir.clone();
        let config = self.config.clone();
        let files = tokio::task::spawn_blocking(move || scan_repository(&scan_root, &config))
            .await
            .map_err(|e| Error::Source(format!("Enumeration task failed: {}", e)))??;

        tracing::info!(
            url = %source_ref,
            files = files.len(),
            commit = commit_hash.as_deref().unwrap_or("-"),
            "Enumerated cloned source"
        );

        let mut snapshot = SourceSnapshot::new(dir, source_ref.to_string(), files)
            .with_revision(commit_hash, branch.map(str::to_string).or(detected_branch));
        snapshot.checkout = Some(guard);
        Ok(snapshot)
    }
}
