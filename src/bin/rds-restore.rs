//! # rds-restore
//!
//! Restores the newest snapshot of an RDS instance into a new
//! timestamp-named instance, optionally repointing DNS at it and removing the
//! instance the previous run created.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use converge::clock::SystemClock;
use converge::config::{RestoreConfig, RestoreSettings, SettingsLoader};
use converge::console;
use converge::error::Result;
use converge::logging::{init_structured_logging, log_error};
use converge::remote::aws::{load_sdk_config, AwsControlClient};
use converge::remote::EchoingClient;
use converge::restore::{RestoreOrchestrator, RestoreOutcome};

#[derive(Parser, Debug)]
#[command(name = "rds-restore")]
#[command(about = "Restore the latest snapshot of an RDS instance into a new instance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Base name of the new instance; a timestamp suffix is appended
    #[arg(short = 'i', long)]
    instance_basename: Option<String>,

    /// Instance whose snapshots are restored
    #[arg(short = 's', long)]
    source_instance: Option<String>,

    /// Instance class of the new instance, e.g. db.r5.large
    #[arg(short = 'd', long)]
    db_class: Option<String>,

    /// AWS region (default: us-east-1)
    #[arg(short, long)]
    region: Option<String>,

    /// Environment tag for the new instance (default: dev)
    #[arg(short, long)]
    environment: Option<String>,

    /// DB parameter group applied after the restore
    #[arg(long)]
    parameter_group: Option<String>,

    /// DB subnet group to restore into
    #[arg(long)]
    db_subnet_group: Option<String>,

    /// Comma-separated VPC security group ids
    #[arg(long)]
    vpc_sg_ids: Option<String>,

    /// Route 53 hosted zone holding the DNS record
    #[arg(long)]
    hosted_zone_id: Option<String>,

    /// CNAME pointed at the new endpoint
    #[arg(long)]
    dns_record: Option<String>,

    /// Account id used to build the source instance ARN
    #[arg(long)]
    aws_account_id: Option<String>,

    /// Delete the instance recorded by the previous run
    #[arg(long)]
    remove_old_instance: bool,

    /// Print the plan and exit without calling AWS
    #[arg(long)]
    dry_run: bool,

    /// Echo every AWS call before issuing it
    #[arg(long)]
    debug: bool,

    /// Settings file (default: ./converge.toml when present)
    #[arg(short, long, env = "CONVERGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_structured_logging(cli.debug);

    if let Err(err) = run(cli).await {
        log_error("rds-restore", "restore", &err.to_string());
        console::fatal(err.to_string());
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings: RestoreSettings = SettingsLoader::new(cli.config)
        .with_override("basename", cli.instance_basename)
        .with_override("source", cli.source_instance)
        .with_override("db_class", cli.db_class)
        .with_override("region", cli.region)
        .with_override("environment", cli.environment)
        .with_override("parameter_group", cli.parameter_group)
        .with_override("db_subnet_group", cli.db_subnet_group)
        .with_override("vpc_sg_ids", cli.vpc_sg_ids)
        .with_override("hosted_zone_id", cli.hosted_zone_id)
        .with_override("dns_record", cli.dns_record)
        .with_override("aws_account_id", cli.aws_account_id)
        .with_override("remove_old_instance", cli.remove_old_instance.then_some(true))
        .with_override("dry_run", cli.dry_run.then_some(true))
        .with_override("debug", cli.debug.then_some(true))
        .load()?;
    let config = RestoreConfig::resolve(settings)?;
    info!(
        source = %config.source,
        environment = %config.environment,
        region = %config.region,
        dry_run = config.dry_run,
        "rds-restore starting"
    );

    // Credentials are resolved lazily, so a dry run never reaches AWS
    let sdk_config = load_sdk_config(&config.region).await;
    let remote = EchoingClient::new(AwsControlClient::new(&sdk_config), config.debug);
    let clock = SystemClock;

    match RestoreOrchestrator::new(&config, &remote, &clock).run().await? {
        RestoreOutcome::DryRun(_) => info!("Dry run finished"),
        RestoreOutcome::Completed(report) => info!(
            instance = %report.instance_name,
            endpoint = %report.endpoint,
            "Restore finished"
        ),
    }
    Ok(())
}
