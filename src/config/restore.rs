//! Restore workflow options.

use serde::{Deserialize, Serialize};

use super::{present, require, split_csv};
use crate::constants::defaults;
use crate::error::{ConvergeError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreSettings {
    pub basename: Option<String>,
    pub source: Option<String>,
    pub db_class: Option<String>,
    pub region: Option<String>,
    pub environment: Option<String>,
    pub parameter_group: Option<String>,
    pub db_subnet_group: Option<String>,
    /// Comma-separated security group ids.
    pub vpc_sg_ids: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub dns_record: Option<String>,
    pub aws_account_id: Option<String>,
    pub remove_old_instance: Option<bool>,
    pub dry_run: Option<bool>,
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreConfig {
    pub basename: String,
    pub source: String,
    pub db_class: String,
    pub region: String,
    pub environment: String,
    pub parameter_group: Option<String>,
    pub db_subnet_group: Option<String>,
    pub security_group_ids: Vec<String>,
    pub hosted_zone_id: Option<String>,
    pub dns_record: Option<String>,
    pub account_id: Option<String>,
    pub remove_old_instance: bool,
    pub dry_run: bool,
    pub debug: bool,
}

impl RestoreConfig {
    pub fn resolve(settings: RestoreSettings) -> Result<Self> {
        let basename = require(
            settings.basename,
            "basename",
            "Instance Basename required. Use -i flag",
        )?;
        let source = require(
            settings.source,
            "source",
            "Source instance name required. Use -s flag",
        )?;
        let environment = require(
            settings
                .environment
                .or_else(|| Some(defaults::RESTORE_ENVIRONMENT.to_string())),
            "environment",
            "Environment tag not set. Use -e flag",
        )?;
        let db_class = require(settings.db_class, "db_class", "DB Class not set. Use -d flag")?;

        let dns_record = present(settings.dns_record);
        let hosted_zone_id = present(settings.hosted_zone_id);
        if dns_record.is_some() && hosted_zone_id.is_none() {
            return Err(ConvergeError::configuration(
                "hosted_zone_id",
                "Hosted Zone ID required to update DNS. Use --hosted-zone-id",
            ));
        }

        Ok(Self {
            basename,
            source,
            db_class,
            region: present(settings.region).unwrap_or_else(|| defaults::REGION.to_string()),
            environment,
            parameter_group: present(settings.parameter_group),
            db_subnet_group: present(settings.db_subnet_group),
            security_group_ids: split_csv(settings.vpc_sg_ids.as_deref()),
            hosted_zone_id,
            dns_record,
            account_id: present(settings.aws_account_id),
            remove_old_instance: settings.remove_old_instance.unwrap_or(false),
            dry_run: settings.dry_run.unwrap_or(false),
            debug: settings.debug.unwrap_or(false),
        })
    }

    /// ARN of the source instance, when an account id was supplied.
    pub fn source_arn(&self) -> Option<String> {
        self.account_id.as_ref().map(|account| {
            format!("arn:aws:rds:{}:{}:db:{}", self.region, account, self.source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RestoreSettings {
        RestoreSettings {
            basename: Some("reporting".to_string()),
            source: Some("db-main".to_string()),
            db_class: Some("db.t3.medium".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let config = RestoreConfig::resolve(settings()).unwrap();
        assert_eq!(config.environment, "dev");
        assert_eq!(config.region, "us-east-1");
        assert!(!config.dry_run);
        assert!(!config.remove_old_instance);
        assert_eq!(config.source_arn(), None);
    }

    #[test]
    fn test_required_fields() {
        for (settings, expected) in [
            (
                RestoreSettings {
                    basename: None,
                    ..settings()
                },
                "Instance Basename required",
            ),
            (
                RestoreSettings {
                    source: None,
                    ..settings()
                },
                "Source instance name required",
            ),
            (
                RestoreSettings {
                    db_class: None,
                    ..settings()
                },
                "DB Class not set",
            ),
            (
                RestoreSettings {
                    environment: Some(" ".to_string()),
                    ..settings()
                },
                "Environment tag not set",
            ),
        ] {
            let err = RestoreConfig::resolve(settings).unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[test]
    fn test_dns_record_requires_zone() {
        let err = RestoreConfig::resolve(RestoreSettings {
            dns_record: Some("db.example.com".to_string()),
            ..settings()
        })
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_source_arn_and_security_groups() {
        let config = RestoreConfig::resolve(RestoreSettings {
            aws_account_id: Some("123456789012".to_string()),
            region: Some("eu-west-1".to_string()),
            vpc_sg_ids: Some("sg-15143mk14,sg-4514bxu13".to_string()),
            ..settings()
        })
        .unwrap();
        assert_eq!(
            config.source_arn().as_deref(),
            Some("arn:aws:rds:eu-west-1:123456789012:db:db-main")
        );
        assert_eq!(config.security_group_ids, vec!["sg-15143mk14", "sg-4514bxu13"]);
    }
}
