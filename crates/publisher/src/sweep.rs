//! Periodic transition sweep.
//!
//! The scheduler calls [`Workspace::sweep_filtered`] on a fixed interval and
//! remembers which `(rule, boundary, timestamp)` crossings it has already
//! purged for, so a transition that stays inside the window for several
//! ticks only purges once. Moving a rule's start or end date is a new
//! crossing. Crossings are forgotten once they leave the window.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use adex_rules::Boundary;

use crate::error::PublisherError;
use crate::workspace::{SweepReport, Workspace};

type Crossing = (String, Boundary, DateTime<Utc>);

/// Runs workspace sweeps until shutdown is signaled.
pub struct SweepScheduler {
    workspace: Arc<Workspace>,
    interval: Duration,
    purged: HashSet<Crossing>,
    shutdown_rx: mpsc::Receiver<()>,
    report_tx: Option<mpsc::Sender<SweepReport>>,
}

impl SweepScheduler {
    /// Run one sweep now, skipping transitions that were already purged.
    pub async fn tick(&mut self) -> Result<SweepReport, PublisherError> {
        self.tick_at(Utc::now()).await
    }

    /// Run one sweep as of `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<SweepReport, PublisherError> {
        let window = self.workspace.config().scheduler.window();
        self.purged.retain(|(_, _, at)| (now - *at).abs() <= window);

        let purged = &self.purged;
        let report = self
            .workspace
            .sweep_filtered(now, |t| {
                !purged.contains(&(t.rule_id.clone(), t.boundary, t.at))
            })
            .await?;

        if let SweepReport::PurgeTriggered { transitions, purge } = &report
            && !purge.is_failed()
        {
            for t in transitions {
                self.purged.insert((t.rule_id.clone(), t.boundary, t.at));
            }
        }
        Ok(report)
    }

    /// Number of crossings purged for that are still inside the window.
    pub fn purged_count(&self) -> usize {
        self.purged.len()
    }

    /// Run the scheduler until shutdown is signaled.
    pub async fn run(&mut self) {
        info!(interval_secs = self.interval.as_secs(), "sweep scheduler starting");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("sweep scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) => {
                            debug!(?report, "sweep completed");
                            if let Some(tx) = &self.report_tx {
                                let _ = tx.send(report).await;
                            }
                        }
                        Err(e) => error!(error = %e, "error running sweep"),
                    }
                }
            }
        }

        info!("sweep scheduler stopped");
    }
}

/// Builder for creating a [`SweepScheduler`].
#[derive(Default)]
pub struct SweepSchedulerBuilder {
    workspace: Option<Arc<Workspace>>,
    interval: Option<Duration>,
    report_tx: Option<mpsc::Sender<SweepReport>>,
}

impl SweepSchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workspace to sweep.
    #[must_use]
    pub fn workspace(mut self, workspace: Arc<Workspace>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Override the configured sweep interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Receive every sweep report on this channel.
    #[must_use]
    pub fn report_channel(mut self, tx: mpsc::Sender<SweepReport>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// Build the scheduler.
    ///
    /// Returns the scheduler and a shutdown sender.
    pub fn build(self) -> Result<(SweepScheduler, mpsc::Sender<()>), PublisherError> {
        let workspace = self
            .workspace
            .ok_or_else(|| PublisherError::Configuration("workspace is required".into()))?;
        let interval = self
            .interval
            .unwrap_or_else(|| workspace.config().scheduler.interval());
        if interval.is_zero() {
            return Err(PublisherError::Configuration(
                "sweep interval must be positive".into(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Ok((
            SweepScheduler {
                workspace,
                interval,
                purged: HashSet::new(),
                shutdown_rx,
                report_tx: self.report_tx,
            },
            shutdown_tx,
        ))
    }
}
