//! AWS SDK backend for [`RemoteControlClient`] and [`ArtifactStore`].
//!
//! Responses are decoded into the typed payloads here; a response missing a
//! field the workflows depend on becomes `InvalidResponse`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_elasticbeanstalk::types::S3Location;
use aws_sdk_rds::config::Region;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::primitives::DateTime as SmithyDateTime;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

use super::{
    ArtifactLocation, ArtifactStore, DnsUpsert, EnvironmentStatus, InstanceSettings,
    InstanceStatus, RemoteControlClient, RemoteEvent, ResourceTag, RestoreRequest, Snapshot,
};
use crate::error::{ConvergeError, Result};

/// Shared SDK configuration for one region, with credentials from the default chain.
pub async fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

#[derive(Debug, Clone)]
pub struct AwsControlClient {
    beanstalk: aws_sdk_elasticbeanstalk::Client,
    rds: aws_sdk_rds::Client,
    route53: aws_sdk_route53::Client,
}

impl AwsControlClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            beanstalk: aws_sdk_elasticbeanstalk::Client::new(sdk_config),
            rds: aws_sdk_rds::Client::new(sdk_config),
            route53: aws_sdk_route53::Client::new(sdk_config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3ArtifactStore {
    s3: aws_sdk_s3::Client,
}

impl S3ArtifactStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            s3: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

fn transport<E>(operation: &'static str) -> impl FnOnce(E) -> ConvergeError
where
    E: std::error::Error,
{
    move |err| ConvergeError::transport(operation, DisplayErrorContext(err).to_string())
}

fn to_utc(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl RemoteControlClient for AwsControlClient {
    async fn create_version(
        &self,
        application: &str,
        label: &str,
        source: &ArtifactLocation,
    ) -> Result<()> {
        self.beanstalk
            .create_application_version()
            .application_name(application)
            .version_label(label)
            .source_bundle(
                S3Location::builder()
                    .s3_bucket(&source.bucket)
                    .s3_key(&source.key)
                    .build(),
            )
            .send()
            .await
            .map_err(transport("create-application-version"))?;
        Ok(())
    }

    async fn update_environment(&self, environment: &str, label: &str) -> Result<()> {
        self.beanstalk
            .update_environment()
            .environment_name(environment)
            .version_label(label)
            .send()
            .await
            .map_err(transport("update-environment"))?;
        Ok(())
    }

    async fn describe_environment(
        &self,
        application: &str,
        environment: &str,
    ) -> Result<EnvironmentStatus> {
        const OPERATION: &str = "describe-environments";
        let output = self
            .beanstalk
            .describe_environments()
            .application_name(application)
            .environment_names(environment)
            .send()
            .await
            .map_err(transport(OPERATION))?;

        let description = output.environments().first().ok_or_else(|| {
            ConvergeError::invalid_response(
                OPERATION,
                "Environments[0]",
                format!("environment {environment} not found in {application}"),
            )
        })?;
        let status = description
            .status()
            .map(|status| status.as_str().to_string())
            .ok_or_else(|| ConvergeError::invalid_response(OPERATION, "Status", "missing"))?;

        Ok(EnvironmentStatus {
            status,
            health: description.health().map(|health| health.as_str().to_string()),
        })
    }

    async fn describe_events(
        &self,
        application: &str,
        environment: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let output = self
            .beanstalk
            .describe_events()
            .application_name(application)
            .environment_name(environment)
            .start_time(SmithyDateTime::from_secs(since.timestamp()))
            .send()
            .await
            .map_err(transport("describe-events"))?;

        let mut events: Vec<RemoteEvent> = output
            .events()
            .iter()
            .filter_map(|event| {
                let occurred_at = event.event_date().and_then(to_utc)?;
                let message = event.message()?.to_string();
                Some(RemoteEvent {
                    occurred_at,
                    message,
                })
            })
            .collect();
        events.sort_by_key(|event| event.occurred_at);
        Ok(events)
    }

    async fn restore_instance(&self, request: &RestoreRequest) -> Result<()> {
        let tags = request
            .tags
            .iter()
            .map(|tag| {
                aws_sdk_rds::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
            })
            .collect::<Vec<_>>();

        self.rds
            .restore_db_instance_from_db_snapshot()
            .db_instance_identifier(&request.instance_name)
            .db_snapshot_identifier(&request.snapshot_id)
            .db_instance_class(&request.instance_class)
            .multi_az(request.multi_az)
            .publicly_accessible(request.publicly_accessible)
            .auto_minor_version_upgrade(request.auto_minor_version_upgrade)
            .set_db_subnet_group_name(request.subnet_group.clone())
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(transport("restore-db-instance-from-db-snapshot"))?;
        Ok(())
    }

    async fn describe_instance(&self, name: &str) -> Result<InstanceStatus> {
        const OPERATION: &str = "describe-db-instances";
        let output = self
            .rds
            .describe_db_instances()
            .db_instance_identifier(name)
            .send()
            .await
            .map_err(transport(OPERATION))?;

        let instance = output.db_instances().first().ok_or_else(|| {
            ConvergeError::invalid_response(
                OPERATION,
                "DBInstances[0]",
                format!("{name} not found"),
            )
        })?;
        let status = instance
            .db_instance_status()
            .ok_or_else(|| {
                ConvergeError::invalid_response(OPERATION, "DBInstanceStatus", "missing")
            })?
            .to_string();

        Ok(InstanceStatus {
            status,
            endpoint: instance
                .endpoint()
                .and_then(|endpoint| endpoint.address())
                .map(str::to_string),
            arn: instance.db_instance_arn().map(str::to_string),
        })
    }

    async fn describe_snapshots(&self, source_instance: &str) -> Result<Vec<Snapshot>> {
        const OPERATION: &str = "describe-db-snapshots";
        let mut pages = self
            .rds
            .describe_db_snapshots()
            .db_instance_identifier(source_instance)
            .into_paginator()
            .send();

        let mut snapshots = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(transport(OPERATION))?;
            for snapshot in page.db_snapshots() {
                let id = snapshot.db_snapshot_identifier().ok_or_else(|| {
                    ConvergeError::invalid_response(OPERATION, "DBSnapshotIdentifier", "missing")
                })?;
                snapshots.push(Snapshot {
                    id: id.to_string(),
                    created_at: snapshot.snapshot_create_time().and_then(to_utc),
                });
            }
        }
        debug!(source = %source_instance, count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<ResourceTag>> {
        let output = self
            .rds
            .list_tags_for_resource()
            .resource_name(resource_arn)
            .send()
            .await
            .map_err(transport("list-tags-for-resource"))?;

        Ok(output
            .tag_list()
            .iter()
            .filter_map(|tag| Some(ResourceTag::new(tag.key()?, tag.value().unwrap_or_default())))
            .collect())
    }

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<()> {
        let tags = tags
            .iter()
            .map(|tag| {
                aws_sdk_rds::types::Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .build()
            })
            .collect::<Vec<_>>();

        self.rds
            .add_tags_to_resource()
            .resource_name(resource_arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(transport("add-tags-to-resource"))?;
        Ok(())
    }

    async fn modify_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()> {
        let security_groups =
            (!settings.security_group_ids.is_empty()).then(|| settings.security_group_ids.clone());

        self.rds
            .modify_db_instance()
            .db_instance_identifier(name)
            .apply_immediately(settings.apply_immediately)
            .backup_retention_period(settings.backup_retention_days)
            .set_db_parameter_group_name(settings.parameter_group.clone())
            .set_vpc_security_group_ids(security_groups)
            .send()
            .await
            .map_err(transport("modify-db-instance"))?;
        Ok(())
    }

    async fn reboot_instance(&self, name: &str) -> Result<()> {
        self.rds
            .reboot_db_instance()
            .db_instance_identifier(name)
            .send()
            .await
            .map_err(transport("reboot-db-instance"))?;
        Ok(())
    }

    async fn delete_instance(&self, name: &str) -> Result<()> {
        const OPERATION: &str = "delete-db-instance";
        match self
            .rds
            .delete_db_instance()
            .db_instance_identifier(name)
            .skip_final_snapshot(true)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_db_instance_not_found_fault()) =>
            {
                Err(ConvergeError::not_found(OPERATION, name))
            }
            Err(err) => Err(transport(OPERATION)(err)),
        }
    }

    async fn upsert_dns_record(&self, change: &DnsUpsert) -> Result<()> {
        const OPERATION: &str = "change-resource-record-sets";
        let invalid = |e: aws_sdk_route53::error::BuildError| {
            ConvergeError::invalid_response(OPERATION, "ChangeBatch", e.to_string())
        };

        let record = ResourceRecord::builder()
            .value(&change.value)
            .build()
            .map_err(invalid)?;
        let record_set = ResourceRecordSet::builder()
            .name(&change.record)
            .r#type(RrType::from(change.record_type.as_str()))
            .ttl(change.ttl)
            .resource_records(record)
            .build()
            .map_err(invalid)?;
        let upsert = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(invalid)?;
        let batch = ChangeBatch::builder()
            .comment(&change.comment)
            .changes(upsert)
            .build()
            .map_err(invalid)?;

        self.route53
            .change_resource_record_sets()
            .hosted_zone_id(&change.zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(transport(OPERATION))?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn upload(&self, local_path: &Path, destination: &ArtifactLocation) -> Result<()> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            ConvergeError::archive(format!("reading {}: {e}", local_path.display()))
        })?;

        self.s3
            .put_object()
            .bucket(&destination.bucket)
            .key(&destination.key)
            .body(body)
            .send()
            .await
            .map_err(transport("put-object"))?;
        Ok(())
    }
}
