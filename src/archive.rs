//! # Application Bundle
//!
//! Build-context discovery and bundle creation for the deploy workflow, both
//! backed by the local `git` (and `zip` for extra paths) executables.

use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::config::BuildContext;
use crate::constants::defaults;
use crate::error::{ConvergeError, Result};

/// Produces the zip bundle for a commit.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    /// Writes the bundle for `commit` to `destination`, then adds
    /// `extra_paths` recursively. Returns the bundle path.
    async fn build(
        &self,
        commit: &str,
        extra_paths: &[String],
        destination: &Path,
    ) -> Result<PathBuf>;
}

/// A git checkout on the local filesystem.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
}

impl GitWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Branch, commit, build directory and origin URL.
    ///
    /// CI variables take precedence: `CIRCLE_BRANCH`, `CIRCLE_SHA1` and
    /// `CIRCLE_ARTIFACTS`; otherwise git is asked and `/tmp` is used.
    pub async fn discover(&self) -> Result<BuildContext> {
        self.discover_inner()
            .await
            .map_err(|e| ConvergeError::configuration("build_context", format!("{e:#}")))
    }

    async fn discover_inner(&self) -> anyhow::Result<BuildContext> {
        let branch = match non_empty_env("CIRCLE_BRANCH") {
            Some(branch) => branch,
            None => self
                .git(&["symbolic-ref", "--short", "-q", "HEAD"])
                .await
                .context("resolving current branch")?,
        };
        let commit = match non_empty_env("CIRCLE_SHA1") {
            Some(commit) => commit,
            None => self
                .git(&["rev-parse", "HEAD"])
                .await
                .context("resolving HEAD commit")?,
        };
        let build_dir = non_empty_env("CIRCLE_ARTIFACTS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::BUILD_DIR));
        // A checkout without an origin is fine when the bucket is given explicitly
        let remote_url = self
            .git(&["config", "--get", "remote.origin.url"])
            .await
            .ok()
            .filter(|url| !url.is_empty());

        Ok(BuildContext {
            branch,
            commit,
            build_dir,
            remote_url,
        })
    }

    async fn git(&self, args: &[&str]) -> anyhow::Result<String> {
        run(Command::new("git").args(args).current_dir(&self.root))
            .await
            .with_context(|| format!("git {}", args.join(" ")))
    }
}

/// Bundles with `git archive --format=zip` and appends extra paths with `zip -r`.
#[derive(Debug, Clone)]
pub struct GitArchiver {
    workspace: GitWorkspace,
}

impl GitArchiver {
    pub fn new(workspace: GitWorkspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ArchiveBuilder for GitArchiver {
    async fn build(
        &self,
        commit: &str,
        extra_paths: &[String],
        destination: &Path,
    ) -> Result<PathBuf> {
        let root = self.workspace.root();
        let output = destination.to_string_lossy().to_string();

        let mut archive = Command::new("git");
        archive
            .args(["archive", commit, "--format=zip", "-o", output.as_str()])
            .current_dir(root);
        run(&mut archive)
            .await
            .map_err(|e| ConvergeError::archive(format!("git archive {commit}: {e:#}")))?;

        if !extra_paths.is_empty() {
            let mut zip = Command::new("zip");
            zip.arg("-r").arg(&output).args(extra_paths).current_dir(root);
            run(&mut zip)
                .await
                .map_err(|e| ConvergeError::archive(format!("zip -r {output}: {e:#}")))?;
        }

        debug!(archive = %output, extra_paths = extra_paths.len(), "Bundle created");
        Ok(destination.to_path_buf())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Runs a command to completion and returns its trimmed stdout.
async fn run(command: &mut Command) -> anyhow::Result<String> {
    let output = command.output().await.context("failed to spawn")?;
    if !output.status.success() {
        bail!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discover_outside_repository_fails_as_configuration() {
        if std::env::var("CIRCLE_BRANCH").is_ok() || std::env::var("CIRCLE_SHA1").is_ok() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let workspace = GitWorkspace::new(temp_dir.path());
        match workspace.discover().await {
            Err(err) => assert!(err.is_configuration()),
            // git may be absent entirely, or the temp dir may sit inside a checkout
            Ok(context) => assert!(!context.commit.is_empty()),
        }
    }

    #[tokio::test]
    async fn test_run_reports_failure() {
        let result = run(Command::new("git").args(["definitely-not-a-subcommand"])).await;
        assert!(result.is_err());
    }
}
