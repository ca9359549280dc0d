//! # Configuration
//!
//! Each workflow resolves its options once at start-up into an immutable
//! value (`DeployConfig`, `RestoreConfig`) that the orchestrators borrow.
//! Raw layered settings are loaded by [`SettingsLoader`] and validated by the
//! `resolve` constructors; a missing required option fails before any remote
//! call is made.

pub mod deploy;
pub mod loader;
pub mod restore;

pub use deploy::{bucket_from_remote, BuildContext, DeployConfig, DeploySettings};
pub use loader::SettingsLoader;
pub use restore::{RestoreConfig, RestoreSettings};

use crate::error::{ConvergeError, Result};

/// Trimmed value, treating an empty string as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn require(value: Option<String>, field: &str, message: &str) -> Result<String> {
    present(value).ok_or_else(|| ConvergeError::configuration(field, message))
}

/// Splits a comma-separated option, dropping blank entries.
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv() {
        assert_eq!(split_csv(Some("public,scripts/special")), vec!["public", "scripts/special"]);
        assert_eq!(split_csv(Some(" sg-1 , ,sg-2,")), vec!["sg-1", "sg-2"]);
        assert!(split_csv(None).is_empty());
    }

    #[test]
    fn test_require_rejects_blank() {
        assert!(require(Some("  ".to_string()), "application", "required").is_err());
        assert_eq!(
            require(Some(" shop ".to_string()), "application", "required").unwrap(),
            "shop"
        );
    }
}
