//! One-shot upgrade health check against the current cluster.
//!
//! Exit status: 0 healthy, 1 unhealthy, 2 when the check itself could not run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use upgrade_health::adapters::production_collaborators;
use upgrade_health::{Error, HealthCheckEngine, OperatorConfig, UpgradeContext, UpgradePhase};

/// Evaluate cluster health before or after an upgrade.
#[derive(Parser)]
#[command(name = "upgrade-healthcheck")]
#[command(about = "Gate a cluster upgrade on live health signals")]
#[command(version)]
struct Cli {
    /// Operator configuration file (YAML).
    #[arg(long, env = "UPGRADE_HEALTH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Name of the upgrade config being gated.
    #[arg(long, env = "UPGRADE_NAME", default_value = "managed-upgrade-config", global = true)]
    upgrade_name: String,

    /// Namespace of the upgrade config.
    #[arg(
        long,
        env = "UPGRADE_NAMESPACE",
        default_value = "openshift-managed-upgrade-operator",
        global = true
    )]
    namespace: String,

    /// Version the cluster is being upgraded to.
    #[arg(long, env = "TARGET_VERSION", default_value = "", global = true)]
    target_version: String,

    /// Current upgrade phase.
    #[arg(long, default_value = "New", global = true)]
    phase: UpgradePhase,

    /// Require spare worker capacity before upgrading.
    #[arg(long, default_value = "false", global = true)]
    capacity_reservation: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pre-upgrade health check.
    Pre,

    /// Run the post-upgrade health check.
    Post,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn upgrade_context(&self) -> UpgradeContext {
        UpgradeContext::new(&self.upgrade_name, &self.namespace)
            .with_phase(self.phase)
            .with_target_version(&self.target_version)
            .with_capacity_reservation(self.capacity_reservation)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,upgrade_health=info,notify=info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => OperatorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OperatorConfig::default(),
    };

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let collaborators = production_collaborators(client, &config)
        .context("Failed to initialize health check collaborators")?;
    let engine = HealthCheckEngine::new(config.health_check_config(), collaborators);
    let upgrade = cli.upgrade_context();

    match cli.command {
        Commands::Pre => Ok(engine.pre_upgrade_health_check(&upgrade).await?),
        Commands::Post => match engine.post_upgrade_health_check(&upgrade).await {
            Ok(healthy) => Ok(healthy),
            Err(e @ Error::HealthCheckFailed { .. }) => {
                warn!(error = %e, "Post-upgrade health check failed");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli).await {
        Ok(true) => {
            info!(upgrade = %cli.upgrade_name, "Cluster is healthy");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            warn!(upgrade = %cli.upgrade_name, "Cluster is not healthy");
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Health check could not be completed");
            ExitCode::from(2)
        }
    }
}
