//! ASG simulator
//!
//! Runs blue/green deployment scenarios against the in-memory control plane
//! and prints what the manifest chain did.

use anyhow::Context;
use asg_core::OrchestratorConfig;
use asg_sim::{Scenario, TrafficMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ASG simulator CLI
#[derive(Parser)]
#[command(name = "asg-sim")]
#[command(about = "Simulate auto-scaling group blue/green deployments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Orchestrator configuration file (TOML)
    #[arg(short, long, env = "ASG_SIM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level
    #[arg(long, env = "ASG_SIM_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "ASG_SIM_LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a new group and move traffic to it
    Deploy(ScenarioArgs),
    /// Deploy, then replay the captured rollback data
    Rollback(ScenarioArgs),
}

#[derive(Args)]
struct ScenarioArgs {
    /// Name of the group to deploy
    #[arg(short, long, default_value = "web-green")]
    group: String,

    /// Group currently serving prod traffic
    #[arg(long, default_value = "web-blue")]
    prod_group: String,

    /// Canary weights applied in order
    #[arg(long, value_delimiter = ',', default_value = "25,50,100", allow_negative_numbers = true)]
    weights: Vec<i64>,

    /// Swap listeners instead of shifting weights
    #[arg(long, conflicts_with = "weights")]
    swap: bool,

    /// Provider operation to fail, e.g. PutScalingPolicy
    #[arg(long)]
    fail_on: Option<String>,
}

impl ScenarioArgs {
    fn into_scenario(self, rollback: bool) -> Scenario {
        Scenario {
            group: self.group,
            prod_group: self.prod_group,
            traffic: if self.swap {
                TrafficMode::Swap
            } else {
                TrafficMode::Shift(self.weights)
            },
            fail_on: self.fail_on,
            rollback,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = match &cli.config {
        Some(path) => OrchestratorConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OrchestratorConfig::new(),
    };

    let scenario = match cli.command {
        Command::Deploy(args) => args.into_scenario(false),
        Command::Rollback(args) => args.into_scenario(true),
    };
    tracing::info!(
        "Simulating {} -> {} (asg-sim {})",
        scenario.prod_group,
        scenario.group,
        asg_sim::VERSION
    );

    let outcome = asg_sim::run(&scenario, config).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", asg_sim::render_text(&outcome));
    }

    if let Some(failure) = &outcome.failure {
        if !scenario.rollback {
            anyhow::bail!("deployment failed: {}", failure.message);
        }
    }
    Ok(())
}
