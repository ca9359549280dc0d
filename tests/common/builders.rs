//! Workflow configurations and clocks used across the integration tests.

use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use converge::clock::ManualClock;
use converge::config::{BuildContext, DeployConfig, DeploySettings, RestoreConfig, RestoreSettings};

pub const SOURCE_ARN: &str = "arn:aws:rds:us-east-1:123456789012:db:db-main";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::starting_at(start_time()))
}

/// `start_time()` plus `secs`.
pub fn at(secs: i64) -> DateTime<Utc> {
    start_time() + chrono::Duration::seconds(secs)
}

pub fn deploy_config() -> DeployConfig {
    DeployConfig::resolve(
        DeploySettings {
            application: Some("shop".to_string()),
            environment: Some("shop-prod".to_string()),
            extra_zip: Some("vendor, assets".to_string()),
            ..Default::default()
        },
        BuildContext {
            branch: "feature/x".to_string(),
            commit: "abc123".to_string(),
            build_dir: PathBuf::from("/tmp"),
            remote_url: Some("git@github.com:acme/shop.git".to_string()),
        },
    )
    .unwrap()
}

pub fn restore_settings() -> RestoreSettings {
    RestoreSettings {
        basename: Some("reporting".to_string()),
        source: Some("db-main".to_string()),
        db_class: Some("db.r5.large".to_string()),
        environment: Some("staging".to_string()),
        aws_account_id: Some("123456789012".to_string()),
        vpc_sg_ids: Some("sg-1,sg-2".to_string()),
        ..Default::default()
    }
}

pub fn restore_config(settings: RestoreSettings) -> RestoreConfig {
    RestoreConfig::resolve(settings).unwrap()
}

/// Name the restore run starting at `start_time()` gives its instance.
pub fn new_instance_name() -> String {
    "reporting-2024-06-03-093000".to_string()
}
