//! Deployment metrics CLI
//!
//! Reports min/max CPU, memory and JVM heap usage of Kubernetes deployments
//! monitored by Dynatrace, creates matching dashboards, and helps inspect
//! how an environment tags its Kubernetes entities.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use commands::{dashboard, debug, metrics};
use metrics_lib::observability::init_tracing;
use metrics_lib::report::MetricsRequest;
use metrics_lib::{ApiClient, MetricsError};

/// Deployment metrics CLI
#[derive(Parser)]
#[command(name = "dtm")]
#[command(author, version, about = "Kubernetes deployment metrics from Dynatrace", long_about = None)]
pub struct Cli {
    /// Dynatrace environment URL
    #[arg(long, global = true, env = "DYNATRACE_URL")]
    pub url: Option<String>,

    /// Dynatrace API token
    #[arg(long, global = true, env = "DYNATRACE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Settings file (defaults to ~/.config/dtm/config.toml)
    #[arg(long, global = true, env = "DTM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report min/max resource usage per deployment
    Metrics(MetricsArgs),

    /// Create a dashboard with per-deployment tiles
    Dashboard(TargetArgs),

    /// Debug and troubleshooting commands
    #[command(subcommand)]
    Debug(DebugCommands),
}

#[derive(Args)]
pub struct TargetArgs {
    /// Kubernetes cluster name
    #[arg(long)]
    pub cluster: String,

    /// Kubernetes namespace
    #[arg(long)]
    pub namespace: String,

    /// Include JVM heap usage
    #[arg(long)]
    pub include_heap: bool,
}

#[derive(Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Look-back window in hours
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..))]
    pub hours: u32,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub format: output::OutputFormat,

    /// Output file (CSV defaults to an auto-named file)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum DebugCommands {
    /// List entity types, highlighting Kubernetes related ones
    EntityTypes,

    /// Show entities of a type with their tags
    Entities {
        /// Entity type to query
        #[arg(long, default_value = "CLOUD_APPLICATION")]
        entity_type: String,

        /// Filter by cluster tag
        #[arg(long)]
        cluster: Option<String>,

        /// Filter by namespace tag
        #[arg(long)]
        namespace: Option<String>,

        /// Maximum number of entities to show
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A .env file in the working directory (or a parent) fills in unset variables
    let dotenv = dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            exit_code(&err)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings_path = cli.config.clone().or_else(config::default_config_path);
    tracing::debug!(path = ?settings_path, "Loading settings");

    let settings = config::Settings::load(settings_path.as_deref(), cli.url, cli.api_token)?;
    let client_config = settings.client_config()?;
    let client = ApiClient::new(&client_config).context("Failed to create API client")?;

    match cli.command {
        Commands::Metrics(args) => {
            let request = MetricsRequest {
                cluster: args.target.cluster,
                namespace: args.target.namespace,
                hours: args.hours,
                include_heap: args.target.include_heap,
            };
            metrics::show_metrics(&client, request, args.format, args.output).await?;
        }
        Commands::Dashboard(target) => {
            dashboard::create_dashboard(&client, &target.cluster, &target.namespace, target.include_heap)
                .await?;
        }
        Commands::Debug(debug_cmd) => match debug_cmd {
            DebugCommands::EntityTypes => {
                debug::show_entity_types(&client).await?;
            }
            DebugCommands::Entities {
                entity_type,
                cluster,
                namespace,
                limit,
            } => {
                debug::show_entities(&client, &entity_type, cluster.as_deref(), namespace.as_deref(), limit)
                    .await?;
            }
        },
    }

    Ok(())
}

/// 2 for configuration problems, 1 for everything else
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let configuration = err
        .chain()
        .filter_map(|e| e.downcast_ref::<MetricsError>())
        .any(|e| matches!(e, MetricsError::Configuration(_)));

    if configuration {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
