//! # Control-Plane Clients
//!
//! [`RemoteControlClient`] is the narrow interface the orchestrators drive:
//! imperative requests that mutate a remote resource and describe requests
//! that read its current state. [`ArtifactStore`] receives the built
//! application bundle. Both are region-bound at construction.
//!
//! Implementations must surface any failed call as
//! [`ConvergeError::Transport`](crate::error::ConvergeError::Transport) and any
//! unexpected payload shape as
//! [`ConvergeError::InvalidResponse`](crate::error::ConvergeError::InvalidResponse).
//! Neither is ever reported as a status value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::Result;

#[cfg(feature = "aws")]
pub mod aws;
pub mod echo;
pub mod types;

pub use echo::EchoingClient;
pub use types::{
    ArtifactLocation, DnsUpsert, EnvironmentStatus, InstanceSettings, InstanceStatus, RemoteEvent,
    ResourceTag, RestoreRequest, Snapshot,
};

#[async_trait]
pub trait RemoteControlClient: Send + Sync {
    /// Registers an uploaded bundle as a deployable application version.
    async fn create_version(
        &self,
        application: &str,
        label: &str,
        source: &ArtifactLocation,
    ) -> Result<()>;

    async fn update_environment(&self, environment: &str, label: &str) -> Result<()>;

    async fn describe_environment(
        &self,
        application: &str,
        environment: &str,
    ) -> Result<EnvironmentStatus>;

    /// Activity log entries recorded at or after `since`, oldest first.
    async fn describe_events(
        &self,
        application: &str,
        environment: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>>;

    async fn restore_instance(&self, request: &RestoreRequest) -> Result<()>;

    async fn describe_instance(&self, name: &str) -> Result<InstanceStatus>;

    /// Snapshots of `source_instance`. No ordering is guaranteed.
    async fn describe_snapshots(&self, source_instance: &str) -> Result<Vec<Snapshot>>;

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<ResourceTag>>;

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<()>;

    async fn modify_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()>;

    async fn reboot_instance(&self, name: &str) -> Result<()>;

    /// Deletes an instance without taking a final snapshot.
    async fn delete_instance(&self, name: &str) -> Result<()>;

    async fn upsert_dns_record(&self, change: &DnsUpsert) -> Result<()>;
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(&self, local_path: &Path, destination: &ArtifactLocation) -> Result<()>;
}
