//! AdExclusion CLI
//!
//! Evaluate, compile and inspect rule sets stored as JSON files.

mod commands;

use std::path::PathBuf;

use adex_publisher::PublisherConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// AdExclusion CLI: evaluate, compile and inspect exclusion rules.
#[derive(Parser, Debug)]
#[command(name = "adex", version, about)]
struct Cli {
    /// Publisher configuration file (TOML).
    #[arg(long, env = "ADEX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate rules against a targeting context.
    Eval(commands::eval::EvalArgs),
    /// Compile rules into the page script.
    Compile(commands::compile::CompileArgs),
    /// Classify the change between two rule lists.
    Diff(commands::diff::DiffArgs),
    /// Find rules crossing a schedule boundary, optionally on a timer.
    Sweep(commands::sweep::SweepArgs),
    /// Show what would be served for a stored envelope.
    Artifact(commands::artifact::ArtifactArgs),
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PublisherConfig> {
    let Some(path) = path else {
        return Ok(PublisherConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    Ok(PublisherConfig::from_toml_str(&raw)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Eval(args) => commands::eval::run(&args, &cli.format),
        Command::Compile(args) => commands::compile::run(&args, &cli.format),
        Command::Diff(args) => commands::diff::run(&args, &config, &cli.format),
        Command::Sweep(args) => commands::sweep::run(&args, config, &cli.format).await,
        Command::Artifact(args) => commands::artifact::run(&args, &cli.format),
    }
}
