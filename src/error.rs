//! # Error Types
//!
//! Every failure in a deploy or restore run is terminal for the process. The
//! variants separate the causes so the binaries can report them precisely,
//! but all of them map to exit code 1.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvergeError {
    #[error("Configuration error: {field}: {message}")]
    Configuration { field: String, message: String },

    #[error("Remote call failed: {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Invalid response from {operation}: {field} - {reason}")]
    InvalidResponse {
        operation: String,
        field: String,
        reason: String,
    },

    #[error("{message}")]
    Timeout {
        phase: String,
        waited_secs: u64,
        message: String,
    },

    #[error("{environment} is unhealthy after deployment.")]
    Unhealthy {
        environment: String,
        health: Option<String>,
    },

    #[error("{resource} not found ({operation})")]
    NotFound { operation: String, resource: String },

    #[error("No completed snapshot found for source instance {source_instance}")]
    NoSnapshot { source_instance: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvergeError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// A payload was returned but did not have the shape the workflow relies on.
    pub fn invalid_response(
        operation: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(phase: impl Into<String>, waited_secs: u64, message: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
            waited_secs,
            message: message.into(),
        }
    }

    /// The control plane reports that the target resource does not exist.
    pub fn not_found(operation: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::NotFound {
            operation: operation.into(),
            resource: resource.into(),
        }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        1
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for failures raised before any remote call was issued.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<config::ConfigError> for ConvergeError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration("settings", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConvergeError::configuration(
            "application",
            "EB Application Name required. Use -a flag",
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: application: EB Application Name required. Use -a flag"
        );

        let err = ConvergeError::Unhealthy {
            environment: "web-prod".to_string(),
            health: Some("Red".to_string()),
        };
        assert_eq!(err.to_string(), "web-prod is unhealthy after deployment.");

        let err = ConvergeError::timeout("update", 900, "Update timed out.");
        assert_eq!(err.to_string(), "Update timed out.");
    }

    #[test]
    fn test_every_failure_exits_non_zero() {
        let errors = [
            ConvergeError::configuration("region", "empty"),
            ConvergeError::transport("describe-environments", "connection reset"),
            ConvergeError::archive("git archive failed"),
            ConvergeError::NoSnapshot {
                source_instance: "db-main".to_string(),
            },
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_configuration_classification() {
        assert!(ConvergeError::configuration("source", "missing").is_configuration());
        assert!(!ConvergeError::transport("reboot-db-instance", "denied").is_configuration());
    }

    #[test]
    fn test_not_found_is_distinct_from_transport() {
        let err = ConvergeError::not_found("delete-db-instance", "reporting-2024-05-01-000000");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "reporting-2024-05-01-000000 not found (delete-db-instance)"
        );
        assert!(!ConvergeError::transport("delete-db-instance", "throttled").is_not_found());
    }
}
