//! # eb-deploy
//!
//! Deploys the current git commit to an Elastic Beanstalk environment and
//! waits for the environment to finish updating and report `Green`.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use converge::archive::{GitArchiver, GitWorkspace};
use converge::clock::SystemClock;
use converge::config::{DeployConfig, DeploySettings, SettingsLoader};
use converge::console;
use converge::deploy::DeployOrchestrator;
use converge::error::Result;
use converge::logging::{init_structured_logging, log_error};
use converge::remote::aws::{load_sdk_config, AwsControlClient, S3ArtifactStore};
use converge::remote::EchoingClient;

#[derive(Parser, Debug)]
#[command(name = "eb-deploy")]
#[command(about = "Deploy the current commit to an Elastic Beanstalk environment")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// EB application name
    #[arg(short = 'a', long = "app")]
    application: Option<String>,

    /// EB environment name
    #[arg(short = 'e', long = "env")]
    environment: Option<String>,

    /// AWS region (default: us-east-1)
    #[arg(short, long)]
    region: Option<String>,

    /// Comma-separated paths added to the bundle
    #[arg(long)]
    extra_zip: Option<String>,

    /// S3 bucket for the bundle (default: derived from the origin remote)
    #[arg(long)]
    s3_bucket: Option<String>,

    /// Echo every AWS call before issuing it
    #[arg(short, long)]
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
        log_error("eb-deploy", "deploy", &err.to_string());
        console::fatal(err.to_string());
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings: DeploySettings = SettingsLoader::new(cli.config)
        .with_override("application", cli.application)
        .with_override("environment", cli.environment)
        .with_override("region", cli.region)
        .with_override("s3_bucket", cli.s3_bucket)
        .with_override("extra_zip", cli.extra_zip)
        .with_override("debug", cli.debug.then_some(true))
        .load()?;
    settings.require_target()?;

    let workspace = GitWorkspace::current_dir()?;
    let context = workspace.discover().await?;
    let config = DeployConfig::resolve(settings, context)?;
    info!(
        application = %config.application,
        environment = %config.environment,
        region = %config.region,
        "eb-deploy starting"
    );

    let sdk_config = load_sdk_config(&config.region).await;
    let remote = EchoingClient::new(AwsControlClient::new(&sdk_config), config.debug);
    let store = EchoingClient::new(S3ArtifactStore::new(&sdk_config), config.debug);
    let archiver = GitArchiver::new(workspace);
    let clock = SystemClock;

    let orchestrator = DeployOrchestrator::new(&config, &remote, &store, &archiver, &clock);
    orchestrator.announce();
    orchestrator.run().await?;
    Ok(())
}
