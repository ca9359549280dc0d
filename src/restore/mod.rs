//! # Restore Workflow
//!
//! Restore the newest snapshot of a source database into a fresh,
//! timestamp-named instance, apply settings, reboot, then optionally point a
//! DNS record at it, remove the previous generation, and record the new
//! generation in a tag on the source instance.
//!
//! Every availability wait has its own one-hour deadline. A wait that runs
//! out is fatal.

pub mod plan;

pub use plan::{instance_name, select_latest_snapshot, RestorePlan};

use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::clock::Clock;
use crate::config::RestoreConfig;
use crate::console;
use crate::constants::{horizons, settle};
use crate::error::{ConvergeError, Result};
use crate::logging::log_stage_operation;
use crate::poll::{NoHook, PollLoop, PollOutcome, PollPolicy};
use crate::remote::{DnsUpsert, InstanceStatus, RemoteControlClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub instance_name: String,
    pub snapshot_id: String,
    pub endpoint: String,
    pub previous_instance: Option<String>,
    pub previous_instance_removed: bool,
    pub dns_updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was sent to the control plane.
    DryRun(RestorePlan),
    Completed(RestoreReport),
}

pub struct RestoreOrchestrator<'a> {
    config: &'a RestoreConfig,
    remote: &'a dyn RemoteControlClient,
    clock: &'a dyn Clock,
}

impl<'a> RestoreOrchestrator<'a> {
    pub fn new(
        config: &'a RestoreConfig,
        remote: &'a dyn RemoteControlClient,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            remote,
            clock,
        }
    }

    #[instrument(
        skip(self),
        fields(source = %self.config.source, environment = %self.config.environment)
    )]
    pub async fn run(&self) -> Result<RestoreOutcome> {
        let plan = RestorePlan::new(self.config, self.clock.now());
        let name = plan.instance_name.as_str();

        console::info(format!("Instance Name: {name}"));
        console::info(format!(
            "VPC SG IDs: {}",
            self.config.security_group_ids.join(" ")
        ));

        if self.config.dry_run {
            println!("Dry Run. Will not execute API calls.");
            println!(
                "{}",
                serde_json::to_string_pretty(&plan)
                    .unwrap_or_else(|_| "[serialization error]".to_string())
            );
            return Ok(RestoreOutcome::DryRun(plan));
        }

        let snapshots = self.remote.describe_snapshots(&self.config.source).await?;
        let snapshot = select_latest_snapshot(&self.config.source, &snapshots)?;
        console::info(format!("Snapshot: {}", snapshot.id));

        let previous_instance = match &plan.source_arn {
            Some(arn) => {
                let tags = self.remote.list_tags(arn).await?;
                let previous = plan.previous_instance(&tags);
                console::info(format!(
                    "Old Instance Name: {}",
                    previous.as_deref().unwrap_or("")
                ));
                previous
            }
            None => None,
        };

        console::info(format!("Creating Instance: {name}"));
        self.remote
            .restore_instance(&plan.restore_request(&snapshot.id))
            .await?;
        self.wait_until_available(name, "create").await?;
        self.settle(settle::AFTER_CREATE).await;

        console::info(format!("Updating instance settings on {name}"));
        self.remote
            .modify_instance(name, &plan.instance_settings())
            .await?;
        self.wait_until_available(name, "modify").await?;
        self.settle(settle::AFTER_MODIFY).await;

        console::info(format!("Rebooting instance: {name}"));
        self.remote.reboot_instance(name).await?;
        self.wait_until_available(name, "reboot").await?;
        self.settle(settle::AFTER_REBOOT).await;

        let endpoint = self
            .remote
            .describe_instance(name)
            .await?
            .endpoint
            .ok_or_else(|| {
                ConvergeError::invalid_response(
                    "describe-db-instances",
                    "Endpoint.Address",
                    format!("{name} is available but reports no endpoint"),
                )
            })?;
        console::info(format!("Ready to update DNS records with: {endpoint}"));

        let dns_updated = match (&self.config.dns_record, &self.config.hosted_zone_id) {
            (Some(record), Some(zone_id)) => {
                console::info(format!("Updating DNS for {record}"));
                self.remote
                    .upsert_dns_record(&DnsUpsert::cname(zone_id, record, endpoint.as_str()))
                    .await?;
                log_stage_operation("restore", "dns_updated", "complete", Some(record));
                true
            }
            _ => false,
        };

        let previous_instance_removed = self.remove_previous(previous_instance.as_deref()).await?;

        console::info("Setting new tags for restored instance on master host.");
        let source_arn = match &plan.source_arn {
            Some(arn) => arn.clone(),
            None => self.source_arn_from_remote().await?,
        };
        self.remote
            .add_tags(&source_arn, &[plan.generation_tag()])
            .await?;
        log_stage_operation("restore", "tag_set", "complete", Some(&source_arn));

        console::info("Process complete!");
        info!(instance = %name, snapshot = %snapshot.id, "Restore complete");

        Ok(RestoreOutcome::Completed(RestoreReport {
            instance_name: plan.instance_name.clone(),
            snapshot_id: snapshot.id,
            endpoint,
            previous_instance,
            previous_instance_removed,
            dns_updated,
        }))
    }

    async fn wait_until_available(&self, name: &str, phase: &str) -> Result<InstanceStatus> {
        console::info("Polling for status 'available' status.");
        console::info_inline("Polling...");
        let remote = self.remote;
        let outcome = PollLoop::new(self.clock, PollPolicy::within(horizons::INSTANCE_AVAILABILITY))
            .run(
                move || remote.describe_instance(name),
                |status: &InstanceStatus| !status.is_available(),
                &mut NoHook,
            )
            .await?;
        console::end_line();

        match outcome {
            PollOutcome::Converged { observed, .. } => {
                console::info("Update complete");
                log_stage_operation("restore", phase, "available", Some(name));
                Ok(observed)
            }
            PollOutcome::TimedOut { last, .. } => {
                let status = last.map(|s| s.status).unwrap_or_else(|| "unknown".to_string());
                Err(ConvergeError::timeout(
                    phase,
                    horizons::INSTANCE_AVAILABILITY.as_secs(),
                    format!(
                        "Instance {name} did not become available within {}s \
                         after {phase} (last status: {status}).",
                        horizons::INSTANCE_AVAILABILITY.as_secs()
                    ),
                ))
            }
        }
    }

    async fn settle(&self, pause: Duration) {
        console::info(format!("Sleeping for {} seconds...", pause.as_secs()));
        self.clock.sleep(pause).await;
    }

    async fn remove_previous(&self, previous: Option<&str>) -> Result<bool> {
        if !self.config.remove_old_instance {
            console::info("Will not remove old instance. Value was not 'true'.");
            return Ok(false);
        }
        let Some(previous) = previous else {
            warn!(
                source = %self.config.source,
                "Old instance removal requested but no previous instance is recorded"
            );
            console::info("No previous instance recorded on the source. Nothing to remove.");
            return Ok(false);
        };
        if previous == self.config.source {
            warn!(instance = %previous, "Refusing to delete the restore source");
            return Ok(false);
        }

        console::info(format!("Old Instance: {previous}"));
        match self.remote.delete_instance(previous).await {
            Ok(()) => {
                console::info(format!(
                    "Sent API call to AWS to terminate RDS instance {previous}"
                ));
                Ok(true)
            }
            // Already gone; the generation tag still has to move forward
            Err(err) if err.is_not_found() => {
                warn!(instance = %previous, "Previous instance no longer exists");
                console::info(format!(
                    "Old instance {previous} no longer exists. Skipping."
                ));
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn source_arn_from_remote(&self) -> Result<String> {
        self.remote
            .describe_instance(&self.config.source)
            .await?
            .arn
            .ok_or_else(|| {
                ConvergeError::invalid_response(
                    "describe-db-instances",
                    "DBInstanceArn",
                    format!("no ARN reported for {}", self.config.source),
                )
            })
    }
}
