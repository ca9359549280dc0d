//! # Structured Logging Module
//!
//! Diagnostic tracing for deploy and restore runs. User-facing progress lines
//! go through [`crate::console`]; this module only configures `tracing`.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` always wins. Otherwise the level comes from `CONVERGE_ENV`,
/// and `debug` forces the debug level regardless of environment.
pub fn init_structured_logging(debug: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = if debug {
            "debug".to_string()
        } else {
            get_log_level(&environment)
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let json = std::env::var("CONVERGE_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .with_filter(filter)
                .boxed()
        };

        // A subscriber may already be installed by an embedding test harness
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::debug!(
            environment = %environment,
            level = %log_level,
            json = json,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("CONVERGE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "production".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "test" | "development" => "debug".to_string(),
        _ => "warn".to_string(),
    }
}

/// Log structured data for a workflow stage transition
pub fn log_stage_operation(operation: &str, stage: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        stage = %stage,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STAGE_OPERATION"
    );
}

/// Log structured data for a single control-plane call
pub fn log_remote_call(operation: &str, target: &str, duration_ms: u64, outcome: &str) {
    tracing::debug!(
        operation = %operation,
        target = %target,
        duration_ms = duration_ms,
        outcome = %outcome,
        "REMOTE_CALL"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
