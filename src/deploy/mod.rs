//! # Deploy Workflow
//!
//! Bundle the checkout, upload it, register it as an application version,
//! point the environment at it, then wait for the update to finish and for
//! the environment to report `Green`.
//!
//! Remote mutations are not rolled back. A failure leaves the environment in
//! whatever state the last successful call produced.

pub mod label;

pub use label::{clean_branch, VersionLabel};

use std::path::PathBuf;
use tracing::{info, instrument};

use crate::archive::ArchiveBuilder;
use crate::clock::Clock;
use crate::config::DeployConfig;
use crate::console;
use crate::constants::horizons;
use crate::error::{ConvergeError, Result};
use crate::events::EventStream;
use crate::logging::log_stage_operation;
use crate::poll::{NoHook, PollLoop, PollOutcome, PollPolicy};
use crate::remote::{ArtifactStore, EnvironmentStatus, RemoteControlClient};

/// Stages of a deploy run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    ArchiveBuilt,
    Uploaded,
    VersionCreated,
    UpdateRequested,
    Converged,
    Healthy,
}

impl DeployStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArchiveBuilt => "archive_built",
            Self::Uploaded => "uploaded",
            Self::VersionCreated => "version_created",
            Self::UpdateRequested => "update_requested",
            Self::Converged => "converged",
            Self::Healthy => "healthy",
        }
    }
}

/// What a successful deploy produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub label: VersionLabel,
    pub archive: PathBuf,
    pub final_status: EnvironmentStatus,
    pub update_ticks: u32,
    pub health_ticks: u32,
    pub event_fetches: u32,
}

pub struct DeployOrchestrator<'a> {
    config: &'a DeployConfig,
    remote: &'a dyn RemoteControlClient,
    store: &'a dyn ArtifactStore,
    archiver: &'a dyn ArchiveBuilder,
    clock: &'a dyn Clock,
}

impl<'a> DeployOrchestrator<'a> {
    pub fn new(
        config: &'a DeployConfig,
        remote: &'a dyn RemoteControlClient,
        store: &'a dyn ArtifactStore,
        archiver: &'a dyn ArchiveBuilder,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            remote,
            store,
            archiver,
            clock,
        }
    }

    /// Prints the resolved options the way the run will use them.
    pub fn announce(&self) {
        let config = self.config;
        console::info(format!("Branch Name: {}", config.branch));
        console::info(format!("Clean Branch Name: {}", clean_branch(&config.branch)));
        console::info(format!("S3 Bucket: {}", config.bucket));
        console::info(format!("Commit: {}", config.commit));
        console::info(format!("Build Dir: {}", config.build_dir.display()));
        console::info(format!("EB Application: {}", config.application));
        console::info(format!("EB Environment: {}", config.environment));
        console::info(format!("EB Version Label: {}", config.label));
    }

    #[instrument(
        skip(self),
        fields(application = %self.config.application, environment = %self.config.environment)
    )]
    pub async fn run(&self) -> Result<DeployReport> {
        let config = self.config;
        let application = config.application.as_str();
        let environment = config.environment.as_str();
        let label = &config.label;

        console::info("Creating archive...");
        let archive = self
            .archiver
            .build(&config.commit, &config.extra_paths, &config.archive_path())
            .await?;
        self.stage(DeployStage::ArchiveBuilt, Some(&archive.display().to_string()));

        console::info("Uploading archive...");
        let location = config.artifact_location();
        self.store.upload(&archive, &location).await?;
        self.stage(DeployStage::Uploaded, Some(&location.to_string()));

        console::info("Creating version...");
        self.remote
            .create_version(application, label.as_str(), &location)
            .await?;
        self.stage(DeployStage::VersionCreated, Some(label.as_str()));

        console::info(format!("Deploying to {environment}"));
        let mut events = EventStream::new(self.remote, application, environment, self.clock.now());
        self.remote
            .update_environment(environment, label.as_str())
            .await?;
        self.stage(DeployStage::UpdateRequested, None);

        console::info_inline("Waiting for update to complete.");
        let remote = self.remote;
        let update = PollLoop::new(self.clock, PollPolicy::within(horizons::UPDATE_COMPLETION))
            .run(
                move || remote.describe_environment(application, environment),
                EnvironmentStatus::is_updating,
                &mut events,
            )
            .await?;
        console::end_line();

        console::info("Checking state of Environment...");
        let update_ticks = match update {
            PollOutcome::Converged { ticks, .. } => ticks,
            PollOutcome::TimedOut { .. } => {
                return Err(ConvergeError::timeout(
                    "update",
                    horizons::UPDATE_COMPLETION.as_secs(),
                    "Update timed out.",
                ))
            }
        };
        console::info("Update Complete!");
        self.stage(DeployStage::Converged, None);

        console::info_inline("Waiting for environment to become healthy");
        let health = PollLoop::new(self.clock, PollPolicy::within(horizons::HEALTH_CHECK))
            .run(
                move || remote.describe_environment(application, environment),
                |status: &EnvironmentStatus| !status.is_green(),
                &mut NoHook,
            )
            .await?;
        console::end_line();

        match health {
            PollOutcome::Converged {
                observed,
                ticks: health_ticks,
            } => {
                console::info(format!("Environment health: {}", observed.health_label()));
                console::info("Environment successfully updated.");
                self.stage(DeployStage::Healthy, Some(observed.health_label()));
                info!(label = %label, update_ticks, health_ticks, "Deploy complete");
                Ok(DeployReport {
                    label: label.clone(),
                    archive,
                    final_status: observed,
                    update_ticks,
                    health_ticks,
                    event_fetches: events.fetches(),
                })
            }
            PollOutcome::TimedOut { last, .. } => {
                let health = last.and_then(|status| status.health);
                console::info(format!(
                    "Environment health: {}",
                    health.as_deref().unwrap_or("unknown")
                ));
                Err(ConvergeError::Unhealthy {
                    environment: environment.to_string(),
                    health,
                })
            }
        }
    }

    fn stage(&self, stage: DeployStage, details: Option<&str>) {
        log_stage_operation("deploy", stage.as_str(), "complete", details);
    }
}
