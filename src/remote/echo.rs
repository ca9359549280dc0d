//! Debug decorator that prints every control-plane call before issuing it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::Path;
use std::time::Instant;

use super::{
    ArtifactLocation, ArtifactStore, DnsUpsert, EnvironmentStatus, InstanceSettings,
    InstanceStatus, RemoteControlClient, RemoteEvent, ResourceTag, RestoreRequest, Snapshot,
};
use crate::console;
use crate::error::Result;
use crate::logging::log_remote_call;

/// Wraps a client; when `enabled`, each call is echoed as
/// `Executing Command: <operation> <arguments>` on the console.
#[derive(Debug)]
pub struct EchoingClient<C> {
    inner: C,
    enabled: bool,
}

impl<C> EchoingClient<C> {
    pub fn new(inner: C, enabled: bool) -> Self {
        Self { inner, enabled }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn echo(&self, command: String) {
        if self.enabled {
            println!();
            console::info(format!("Executing Command: {command}"));
        }
    }
}

impl<C: Sync> EchoingClient<C> {
    /// Echoes the command line, awaits the call and logs its duration and outcome.
    async fn run<T, F>(&self, operation: &str, target: &str, command: String, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        self.echo(format!("{operation} {command}"));
        let started = Instant::now();
        let result = call.await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        log_remote_call(
            operation,
            target,
            started.elapsed().as_millis() as u64,
            outcome,
        );
        result
    }
}

#[async_trait]
impl<C: RemoteControlClient> RemoteControlClient for EchoingClient<C> {
    async fn create_version(
        &self,
        application: &str,
        label: &str,
        source: &ArtifactLocation,
    ) -> Result<()> {
        self.run(
            "create-application-version",
            application,
            format!(
                "--application-name {application} --version-label {label} --source-bundle S3Bucket={},S3Key={}",
                source.bucket, source.key
            ),
            self.inner.create_version(application, label, source),
        )
        .await
    }

    async fn update_environment(&self, environment: &str, label: &str) -> Result<()> {
        self.run(
            "update-environment",
            environment,
            format!("--environment-name {environment} --version-label {label}"),
            self.inner.update_environment(environment, label),
        )
        .await
    }

    async fn describe_environment(
        &self,
        application: &str,
        environment: &str,
    ) -> Result<EnvironmentStatus> {
        self.run(
            "describe-environments",
            environment,
            format!("--application-name {application} --environment-names {environment}"),
            self.inner.describe_environment(application, environment),
        )
        .await
    }

    async fn describe_events(
        &self,
        application: &str,
        environment: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        self.run(
            "describe-events",
            environment,
            format!(
                "--application-name {application} --environment-name {environment} --start-time {}",
                since.to_rfc3339()
            ),
            self.inner.describe_events(application, environment, since),
        )
        .await
    }

    async fn restore_instance(&self, request: &RestoreRequest) -> Result<()> {
        let mut command = format!(
            "--db-instance-identifier {} --db-snapshot-identifier {} --db-instance-class {}",
            request.instance_name, request.snapshot_id, request.instance_class
        );
        if let Some(subnet_group) = &request.subnet_group {
            command.push_str(&format!(" --db-subnet-group-name {subnet_group}"));
        }
        self.run(
            "restore-db-instance-from-db-snapshot",
            &request.instance_name,
            command,
            self.inner.restore_instance(request),
        )
        .await
    }

    async fn describe_instance(&self, name: &str) -> Result<InstanceStatus> {
        self.run(
            "describe-db-instances",
            name,
            format!("--db-instance-identifier {name}"),
            self.inner.describe_instance(name),
        )
        .await
    }

    async fn describe_snapshots(&self, source_instance: &str) -> Result<Vec<Snapshot>> {
        self.run(
            "describe-db-snapshots",
            source_instance,
            format!("--db-instance-identifier {source_instance}"),
            self.inner.describe_snapshots(source_instance),
        )
        .await
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<ResourceTag>> {
        self.run(
            "list-tags-for-resource",
            resource_arn,
            format!("--resource-name {resource_arn}"),
            self.inner.list_tags(resource_arn),
        )
        .await
    }

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<()> {
        let rendered = tags
            .iter()
            .map(|tag| format!("Key={},Value={}", tag.key, tag.value))
            .collect::<Vec<_>>()
            .join(" ");
        self.run(
            "add-tags-to-resource",
            resource_arn,
            format!("--resource-name {resource_arn} --tags {rendered}"),
            self.inner.add_tags(resource_arn, tags),
        )
        .await
    }

    async fn modify_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()> {
        let mut command = format!(
            "--db-instance-identifier {name} --backup-retention-period {}",
            settings.backup_retention_days
        );
        if settings.apply_immediately {
            command.push_str(" --apply-immediately");
        }
        if let Some(group) = &settings.parameter_group {
            command.push_str(&format!(" --db-parameter-group-name {group}"));
        }
        if !settings.security_group_ids.is_empty() {
            command.push_str(&format!(
                " --vpc-security-group-ids {}",
                settings.security_group_ids.join(" ")
            ));
        }
        self.run(
            "modify-db-instance",
            name,
            command,
            self.inner.modify_instance(name, settings),
        )
        .await
    }

    async fn reboot_instance(&self, name: &str) -> Result<()> {
        self.run(
            "reboot-db-instance",
            name,
            format!("--db-instance-identifier {name}"),
            self.inner.reboot_instance(name),
        )
        .await
    }

    async fn delete_instance(&self, name: &str) -> Result<()> {
        self.run(
            "delete-db-instance",
            name,
            format!("--db-instance-identifier {name} --skip-final-snapshot"),
            self.inner.delete_instance(name),
        )
        .await
    }

    async fn upsert_dns_record(&self, change: &DnsUpsert) -> Result<()> {
        self.run(
            "change-resource-record-sets",
            &change.record,
            format!(
                "--hosted-zone-id {} UPSERT {} {} {} TTL={}",
                change.zone_id, change.record, change.record_type, change.value, change.ttl
            ),
            self.inner.upsert_dns_record(change),
        )
        .await
    }
}

#[async_trait]
impl<C: ArtifactStore> ArtifactStore for EchoingClient<C> {
    async fn upload(&self, local_path: &Path, destination: &ArtifactLocation) -> Result<()> {
        self.run(
            "s3 cp",
            &destination.key,
            format!("{} {destination}", local_path.display()),
            self.inner.upload(local_path, destination),
        )
        .await
    }
}
