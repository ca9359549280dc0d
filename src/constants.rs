//! # Workflow Constants
//!
//! Fixed timings and remote literals shared by the deploy and restore
//! workflows.

use std::time::Duration;

/// Interval between two describe calls inside any wait phase.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

pub mod horizons {
    use std::time::Duration;

    /// Environment update must leave `Updating` within this window.
    pub const UPDATE_COMPLETION: Duration = Duration::from_secs(900);
    /// Environment must report `Green` within this window after the update.
    pub const HEALTH_CHECK: Duration = Duration::from_secs(60);
    /// Database instance must report `available` within this window.
    pub const INSTANCE_AVAILABILITY: Duration = Duration::from_secs(3600);
}

/// Pauses between restore stages, after the instance reports `available`.
pub mod settle {
    use std::time::Duration;

    pub const AFTER_CREATE: Duration = Duration::from_secs(10);
    pub const AFTER_MODIFY: Duration = Duration::from_secs(30);
    pub const AFTER_REBOOT: Duration = Duration::from_secs(10);
}

pub mod status {
    pub const ENVIRONMENT_UPDATING: &str = "Updating";
    pub const HEALTH_GREEN: &str = "Green";
    pub const INSTANCE_AVAILABLE: &str = "available";
}

pub mod defaults {
    pub const REGION: &str = "us-east-1";
    pub const RESTORE_ENVIRONMENT: &str = "dev";
    pub const BUILD_DIR: &str = "/tmp";
    pub const BUCKET_SUFFIX: &str = "-deployments";
    pub const SETTINGS_FILE: &str = "converge.toml";
    pub const ENV_PREFIX: &str = "CONVERGE";
}

pub mod tags {
    /// Key of the tag on the source instance naming the current restored generation.
    pub fn finder_key(environment: &str) -> String {
        format!("current-{environment}")
    }

    /// Prefix stripped from the finder tag's value to recover the instance name.
    pub fn finder_value_prefix(environment: &str) -> String {
        format!("rds-restore::{environment}::")
    }

    /// Key of the tag set on every restored instance at creation time.
    pub const ENVIRONMENT_KEY: &str = "env";
}

pub mod dns {
    pub const RECORD_TYPE: &str = "CNAME";
    pub const TTL_SECS: i64 = 60;
}

/// Timestamp suffix appended to the restore instance basename.
pub const INSTANCE_SUFFIX_FORMAT: &str = "%Y-%m-%d-%H%M%S";
