#![allow(clippy::doc_markdown)] // Allow technical terms like ElasticBeanstalk, RDS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Converge
//!
//! Drives a managed-platform resource through a multi-step lifecycle
//! operation and waits for the control plane to report convergence.
//!
//! ## Overview
//!
//! Two workflows are provided:
//!
//! - **Deploy**: bundle a git commit, upload it, register it as an
//!   application version, update an environment to it, then wait for the
//!   update to finish and the environment to turn `Green`.
//! - **Restore**: restore the newest snapshot of a database instance into a
//!   new timestamp-named instance, apply settings, reboot, and optionally
//!   repoint DNS and retire the previous generation.
//!
//! Each workflow issues a mutating request, then enters a bounded
//! [`poll::PollLoop`] that re-reads the resource at a fixed interval until it
//! leaves its in-progress state or the phase deadline passes. While a deploy
//! waits, new environment events are streamed through [`events::EventStream`].
//!
//! ## Module Organization
//!
//! - [`remote`] - control-plane client traits, typed payloads, AWS backend
//! - [`poll`] - bounded wait loop
//! - [`events`] - incremental activity-log reader
//! - [`deploy`] - deploy orchestration and version labels
//! - [`restore`] - restore orchestration, naming, snapshot selection
//! - [`config`] - layered settings and validated workflow options
//! - [`archive`] - build context discovery and bundle creation
//! - [`clock`] - time source and delays
//! - [`error`] - structured error handling
//!
//! ## Failure model
//!
//! Nothing is retried. A failed remote call, an elapsed wait, or an
//! unhealthy final state ends the run with a non-zero exit code, and the
//! remote resource is left as the last successful call left it.

pub mod archive;
pub mod clock;
pub mod config;
pub mod console;
pub mod constants;
pub mod deploy;
pub mod error;
pub mod events;
pub mod logging;
pub mod poll;
pub mod remote;
pub mod restore;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DeployConfig, RestoreConfig};
pub use deploy::{DeployOrchestrator, DeployReport, VersionLabel};
pub use error::{ConvergeError, Result};
pub use poll::{PollLoop, PollOutcome, PollPolicy};
pub use remote::{ArtifactStore, RemoteControlClient};
pub use restore::{RestoreOrchestrator, RestoreOutcome, RestoreReport};
