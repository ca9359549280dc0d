//! Typed control-plane payloads.
//!
//! Backends decode their wire responses into these structures at the client
//! boundary; the orchestrators never navigate raw response documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{dns, status};

/// Snapshot of an application environment, read fresh on every poll tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentStatus {
    pub status: String,
    pub health: Option<String>,
}

impl EnvironmentStatus {
    pub fn is_updating(&self) -> bool {
        self.status == status::ENVIRONMENT_UPDATING
    }

    pub fn is_green(&self) -> bool {
        self.health.as_deref() == Some(status::HEALTH_GREEN)
    }

    pub fn health_label(&self) -> &str {
        self.health.as_deref().unwrap_or("unknown")
    }
}

/// One entry of the environment's activity log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub occurred_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub status: String,
    pub endpoint: Option<String>,
    pub arn: Option<String>,
}

impl InstanceStatus {
    pub fn is_available(&self) -> bool {
        self.status == status::INSTANCE_AVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    /// Unset while the snapshot is still being taken.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Where an uploaded application bundle lives in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub instance_name: String,
    pub snapshot_id: String,
    pub instance_class: String,
    pub subnet_group: Option<String>,
    pub tags: Vec<ResourceTag>,
    pub multi_az: bool,
    pub publicly_accessible: bool,
    pub auto_minor_version_upgrade: bool,
}

/// Settings applied to a freshly restored instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSettings {
    pub parameter_group: Option<String>,
    pub security_group_ids: Vec<String>,
    pub backup_retention_days: i32,
    pub apply_immediately: bool,
}

/// A single-record UPSERT against a hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsUpsert {
    pub zone_id: String,
    pub record: String,
    pub record_type: String,
    pub value: String,
    pub ttl: i64,
    pub comment: String,
}

impl DnsUpsert {
    /// CNAME `record` -> `endpoint` with the standard short TTL.
    pub fn cname(
        zone_id: impl Into<String>,
        record: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let record = record.into();
        let value = endpoint.into();
        Self {
            comment: format!("Automated update of {record} to {value}"),
            zone_id: zone_id.into(),
            record,
            record_type: dns::RECORD_TYPE.to_string(),
            value,
            ttl: dns::TTL_SECS,
        }
    }
}
