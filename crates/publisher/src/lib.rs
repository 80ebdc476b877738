//! Editing, publishing and serving an AdExclusion rule set.
//!
//! A [`Workspace`] owns one environment's rules in a [`StateStore`]: every
//! edit is validated, classified into an audit entry and snapshotted;
//! [`Workspace::publish`] compiles the active rules into the served artifact
//! and asks a [`CachePurger`] to drop stale copies. The [`SweepScheduler`]
//! purges again whenever a rule crosses its scheduled start or end.
//!
//! [`StateStore`]: adex_state::StateStore

pub mod artifact;
pub mod config;
pub mod error;
pub mod purge;
pub mod sweep;
pub mod testing;
pub mod workspace;

pub use artifact::{ARTIFACT_CACHE_CONTROL, ARTIFACT_CONTENT_TYPE, Artifact, render_artifact};
pub use config::{AuditConfig, PublisherConfig, SchedulerConfig};
pub use error::PublisherError;
pub use purge::{CachePurger, LogPurger};
pub use sweep::{SweepScheduler, SweepSchedulerBuilder};
pub use workspace::{
    PublishReport, PurgeStatus, SweepReport, TransitionRecord, Workspace, WorkspaceBuilder,
};
