//! Login pipeline CLI
//!
//! Runs the login enrichment pipeline and provisions its topics.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{CreateTopicCommand, RunCommand};
use login_pipeline_config::{ObservabilitySettings, PipelineSettings};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "login-pipeline",
    version,
    about = "Stateful enrichment of user login events between Kafka topics",
    long_about = "Consumes raw login events, annotates each one with repeat-IP, \
                  shared-device and per-category counts, and publishes the result.\n\n\
                  Settings are read from defaults, then the YAML file given with \
                  --config, then LOGIN_PIPELINE_* environment variables \
                  (nested keys separated by a double underscore)."
)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "LOGIN_PIPELINE_CONFIG",
        help = "Path to YAML configuration file"
    )]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    /// Kafka bootstrap servers
    #[arg(long, global = true, value_name = "HOSTS", help = "Override kafka.brokers")]
    brokers: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enrichment pipeline until interrupted
    #[command(name = "run")]
    Run(RunCommand),

    /// Create a topic on the cluster
    #[command(name = "create-topic")]
    CreateTopic(CreateTopicCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = PipelineSettings::load(cli.config.clone())?;
    if let Some(brokers) = cli.brokers {
        settings.kafka.brokers = brokers;
    }

    init_tracing(cli.verbose, &settings.observability);

    match cli.command {
        Commands::Run(command) => command.execute(settings).await,
        Commands::CreateTopic(command) => command.execute(settings).await,
    }
}

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over both `--verbose` and the configured level.
fn init_tracing(verbose: bool, observability: &ObservabilitySettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("login_processor=debug,info")
        } else {
            EnvFilter::new(&observability.log_level)
        }
    });

    let json = observability.json_logging;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(false)))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_topic() {
        let cli = Cli::parse_from([
            "login-pipeline",
            "create-topic",
            "--name",
            "processed-user-login",
            "--partitions",
            "3",
            "--brokers",
            "kafka:9092",
        ]);

        assert_eq!(cli.brokers.as_deref(), Some("kafka:9092"));
        match cli.command {
            Commands::CreateTopic(command) => {
                assert_eq!(command.name.as_deref(), Some("processed-user-login"));
                assert_eq!(command.partitions, Some(3));
                assert_eq!(command.replication_factor, None);
            }
            Commands::Run(_) => panic!("expected create-topic"),
        }
    }

    #[test]
    fn test_parse_run_with_config() {
        let cli = Cli::parse_from(["login-pipeline", "run", "-c", "pipeline.yaml", "-v"]);

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("pipeline.yaml")));
        assert!(matches!(cli.command, Commands::Run(RunCommand { report_interval: None })));
    }
}
