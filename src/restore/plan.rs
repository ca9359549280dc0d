//! Local computations for a restore run: naming, snapshot choice and the
//! generation tag that links a source instance to its latest restore.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RestoreConfig;
use crate::constants::{tags, INSTANCE_SUFFIX_FORMAT};
use crate::error::{ConvergeError, Result};
use crate::remote::{InstanceSettings, ResourceTag, RestoreRequest, Snapshot};

/// Everything a restore run decides before touching the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestorePlan {
    pub instance_name: String,
    pub finder_key: String,
    pub finder_value_prefix: String,
    pub source_arn: Option<String>,
    pub config: RestoreConfig,
}

impl RestorePlan {
    pub fn new(config: &RestoreConfig, now: DateTime<Utc>) -> Self {
        Self {
            instance_name: instance_name(&config.basename, now),
            finder_key: tags::finder_key(&config.environment),
            finder_value_prefix: tags::finder_value_prefix(&config.environment),
            source_arn: config.source_arn(),
            config: config.clone(),
        }
    }

    pub fn restore_request(&self, snapshot_id: &str) -> RestoreRequest {
        RestoreRequest {
            instance_name: self.instance_name.clone(),
            snapshot_id: snapshot_id.to_string(),
            instance_class: self.config.db_class.clone(),
            subnet_group: self.config.db_subnet_group.clone(),
            tags: vec![ResourceTag::new(
                tags::ENVIRONMENT_KEY,
                self.config.environment.as_str(),
            )],
            multi_az: false,
            publicly_accessible: true,
            auto_minor_version_upgrade: false,
        }
    }

    pub fn instance_settings(&self) -> InstanceSettings {
        InstanceSettings {
            parameter_group: self.config.parameter_group.clone(),
            security_group_ids: self.config.security_group_ids.clone(),
            backup_retention_days: 0,
            apply_immediately: true,
        }
    }

    /// Tag recording this run's instance as the current generation.
    pub fn generation_tag(&self) -> ResourceTag {
        ResourceTag::new(
            self.finder_key.as_str(),
            format!("{}{}", self.finder_value_prefix, self.instance_name),
        )
    }

    /// Instance name recorded by a previous run, read from the source's tags.
    pub fn previous_instance(&self, source_tags: &[ResourceTag]) -> Option<String> {
        source_tags
            .iter()
            .filter(|tag| tag.key == self.finder_key)
            .last()
            .map(|tag| {
                tag.value
                    .strip_prefix(self.finder_value_prefix.as_str())
                    .unwrap_or(&tag.value)
                    .to_string()
            })
            .filter(|name| !name.is_empty())
    }
}

/// `{basename}-{YYYY-MM-DD-HHMMSS}`.
///
/// The suffix is rendered in UTC so names do not depend on the host's time
/// zone and sort in creation order across machines.
pub fn instance_name(basename: &str, now: DateTime<Utc>) -> String {
    format!("{basename}-{}", now.format(INSTANCE_SUFFIX_FORMAT))
}

/// The most recently created completed snapshot.
///
/// The order the control plane returns snapshots in is not relied upon:
/// snapshots are compared by creation time, and those still being taken
/// (no creation time yet) are skipped.
pub fn select_latest_snapshot(source_instance: &str, snapshots: &[Snapshot]) -> Result<Snapshot> {
    snapshots
        .iter()
        .filter_map(|snapshot| snapshot.created_at.map(|created| (created, snapshot)))
        .max_by_key(|(created, _)| *created)
        .map(|(_, snapshot)| snapshot.clone())
        .ok_or_else(|| ConvergeError::NoSnapshot {
            source_instance: source_instance.to_string(),
        })
}
