use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adex_publisher::{PublisherConfig, SweepReport, SweepSchedulerBuilder, WorkspaceBuilder};
use adex_state_memory::MemoryStateStore;
use chrono::{DateTime, Utc};
use clap::Args;
use tokio::sync::mpsc;
use tracing::info;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Rules file (a rule list or a stored envelope).
    #[arg(long)]
    pub rules: PathBuf,
    /// Sweep time (RFC 3339). Defaults to now. Ignored with `--watch`.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Override the configured transition window.
    #[arg(long)]
    pub window_seconds: Option<u64>,
    /// Keep sweeping on the configured interval until interrupted.
    #[arg(long)]
    pub watch: bool,
    /// Override the configured sweep interval.
    #[arg(long)]
    pub interval_seconds: Option<u64>,
}

pub async fn run(
    args: &SweepArgs,
    mut config: PublisherConfig,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if let Some(window) = args.window_seconds {
        config.scheduler.window_seconds = window;
    }
    if let Some(interval) = args.interval_seconds {
        config.scheduler.interval_seconds = interval;
    }
    config.validate()?;

    let envelope = super::read_envelope(&args.rules)?;
    let workspace = WorkspaceBuilder::new()
        .state(Arc::new(MemoryStateStore::new()))
        .config(config)
        .build()?;
    workspace.save_rules("cli", envelope.rules).await?;

    if !args.watch {
        let report = workspace.sweep(args.at.unwrap_or_else(Utc::now)).await?;
        print_report(&report, format)?;
        return Ok(());
    }

    let (report_tx, mut report_rx) = mpsc::channel(16);
    let (mut scheduler, shutdown_tx) = SweepSchedulerBuilder::new()
        .workspace(Arc::new(workspace))
        .report_channel(report_tx)
        .build()?;
    let handle = tokio::spawn(async move { scheduler.run().await });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping sweep scheduler");
                break;
            }
            report = report_rx.recv() => {
                let Some(report) = report else { break };
                print_report(&report, format)?;
            }
        }
    }

    let _ = shutdown_tx.send(()).await;
    tokio::time::timeout(Duration::from_secs(5), handle).await??;
    Ok(())
}

fn print_report(report: &SweepReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Text => match report {
            SweepReport::NoRules => println!("No rules stored."),
            SweepReport::NoTransitions { checked } => {
                println!("Checked {checked} rule(s), none crossing a schedule boundary.");
            }
            SweepReport::PurgeTriggered { transitions, purge } => {
                for t in transitions {
                    println!(
                        "{} ({}) {} at {}",
                        t.rule_name,
                        t.rule_id,
                        t.boundary.as_str(),
                        t.at.to_rfc3339()
                    );
                }
                println!("Purge: {}", serde_json::to_string(purge)?);
            }
        },
    }
    Ok(())
}
