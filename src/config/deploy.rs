//! Deploy workflow options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{present, require, split_csv};
use crate::constants::defaults;
use crate::deploy::VersionLabel;
use crate::error::{ConvergeError, Result};
use crate::remote::ArtifactLocation;

const APPLICATION_REQUIRED: &str = "EB Application Name required. Use -a flag";
const ENVIRONMENT_REQUIRED: &str = "EB Environment Name required. Use -e flag";

/// Raw layered settings; every field may be absent until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploySettings {
    pub application: Option<String>,
    pub environment: Option<String>,
    pub region: Option<String>,
    pub s3_bucket: Option<String>,
    /// Comma-separated paths added to the bundle after `git archive`.
    pub extra_zip: Option<String>,
    pub debug: Option<bool>,
}

impl DeploySettings {
    /// Checks the options that need no build context, so a missing
    /// application or environment is reported before git is consulted.
    pub fn require_target(&self) -> Result<()> {
        require(self.application.clone(), "application", APPLICATION_REQUIRED)?;
        require(self.environment.clone(), "environment", ENVIRONMENT_REQUIRED)?;
        Ok(())
    }
}

/// Source-control facts about the checkout being deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub branch: String,
    pub commit: String,
    pub build_dir: PathBuf,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployConfig {
    pub application: String,
    pub environment: String,
    pub region: String,
    pub bucket: String,
    pub extra_paths: Vec<String>,
    pub debug: bool,
    pub branch: String,
    pub commit: String,
    pub build_dir: PathBuf,
    pub label: VersionLabel,
}

impl DeployConfig {
    pub fn resolve(settings: DeploySettings, context: BuildContext) -> Result<Self> {
        let application = require(settings.application, "application", APPLICATION_REQUIRED)?;
        let environment = require(settings.environment, "environment", ENVIRONMENT_REQUIRED)?;
        let branch = require(
            Some(context.branch),
            "branch",
            "Branch name could not be determined. Set CIRCLE_BRANCH or check out a branch",
        )?;
        let commit = require(
            Some(context.commit),
            "commit",
            "Commit could not be determined. Set CIRCLE_SHA1 or run inside a git checkout",
        )?;

        let bucket = match present(settings.s3_bucket) {
            Some(bucket) => bucket,
            None => context
                .remote_url
                .as_deref()
                .and_then(bucket_from_remote)
                .ok_or_else(|| {
                    ConvergeError::configuration(
                        "s3_bucket",
                        "S3 bucket could not be derived from remote.origin.url. Use --s3-bucket",
                    )
                })?,
        };

        let label = VersionLabel::new(&branch, &commit);

        Ok(Self {
            application,
            environment,
            region: present(settings.region).unwrap_or_else(|| defaults::REGION.to_string()),
            bucket,
            extra_paths: split_csv(settings.extra_zip.as_deref()),
            debug: settings.debug.unwrap_or(false),
            branch,
            commit,
            build_dir: context.build_dir,
            label,
        })
    }

    pub fn archive_path(&self) -> PathBuf {
        self.build_dir.join(self.label.archive_name())
    }

    pub fn artifact_location(&self) -> ArtifactLocation {
        self.label.artifact_location(&self.bucket, &self.application)
    }
}

/// `{owner}-deployments`, where `owner` is the first path segment of the
/// origin remote (`git@host:owner/repo.git` or `https://host/owner/repo`).
pub fn bucket_from_remote(remote_url: &str) -> Option<String> {
    let remote_url = remote_url.trim();
    let path = if let Some((_, rest)) = remote_url.split_once("://") {
        rest.split_once('/').map(|(_, path)| path)?
    } else {
        remote_url.split_once(':').map(|(_, path)| path)?
    };

    path.split('/')
        .find(|segment| !segment.is_empty())
        .map(|owner| format!("{owner}{}", defaults::BUCKET_SUFFIX))
}
