//! Version labels and artifact keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::remote::ArtifactLocation;

/// Deployable version label `{branch}-{commit}`, with every `/` in the
/// branch replaced by `-`. The same branch and commit always give the same
/// label, so re-running a deploy registers the same version name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionLabel(String);

impl VersionLabel {
    pub fn new(branch: &str, commit: &str) -> Self {
        Self(format!("{}-{}", clean_branch(branch), commit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bundle file name, `{label}.zip`.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.0)
    }

    /// Content-store location `{bucket}/{application}/{label}.zip`.
    pub fn artifact_location(&self, bucket: &str, application: &str) -> ArtifactLocation {
        ArtifactLocation {
            bucket: bucket.to_string(),
            key: format!("{application}/{}", self.archive_name()),
        }
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn clean_branch(branch: &str) -> String {
    branch.replace('/', "-")
}
