use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use adex_audit::{AuditLog, ChangeClassifier};
use adex_core::{AuditEntry, Environment, Rule, RuleSetEnvelope, TargetingContext, validate_rule_set};
use adex_rules::{Boundary, RuleEngine, RuleEvaluationTrace, ScriptCompiler, TransitionDetector};
use adex_state::{StateKey, StateStore};

use crate::artifact::{Artifact, render_artifact};
use crate::config::PublisherConfig;
use crate::error::PublisherError;
use crate::purge::{CachePurger, LogPurger};

/// Outcome of a cache purge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurgeStatus {
    /// The purger accepted the request.
    Purged { url: String },
    /// No artifact URL is configured.
    Skipped,
    /// The purger returned an error. The publish itself still stands.
    Failed { url: String, error: String },
}

impl PurgeStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of [`Workspace::publish`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    /// The audit entry recorded for the publish.
    pub entry: AuditEntry,
    /// Number of rules embedded in the script.
    pub rule_count: usize,
    /// Whether the published script is the no-rules placeholder.
    pub placeholder: bool,
    pub purge: PurgeStatus,
}

/// One schedule boundary crossing found by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub rule_id: String,
    pub rule_name: String,
    pub boundary: Boundary,
    pub at: DateTime<Utc>,
}

/// Result of [`Workspace::sweep`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SweepReport {
    /// Nothing is stored for the environment.
    NoRules,
    /// No rule crosses a boundary inside the window.
    NoTransitions { checked: usize },
    /// At least one rule crossed a boundary and a purge was requested.
    PurgeTriggered {
        transitions: Vec<TransitionRecord>,
        purge: PurgeStatus,
    },
}

impl SweepReport {
    /// Names of the transitioning rules, deduplicated, in list order.
    pub fn rule_names(&self) -> Vec<&str> {
        let Self::PurgeTriggered { transitions, .. } = self else {
            return Vec::new();
        };
        let mut names: Vec<&str> = Vec::new();
        for t in transitions {
            if !names.contains(&t.rule_name.as_str()) {
                names.push(&t.rule_name);
            }
        }
        names
    }
}

/// One environment's rule set with its audit log, snapshots and published
/// artifact.
///
/// Every read-modify-write goes through an internal lock so that concurrent
/// edits from the same process never interleave.
pub struct Workspace {
    state: Arc<dyn StateStore>,
    purger: Arc<dyn CachePurger>,
    config: PublisherConfig,
    compiler: ScriptCompiler,
    classifier: ChangeClassifier,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    fn rules_key(&self) -> StateKey {
        StateKey::rules(&self.config.namespace, self.config.environment)
    }

    fn audit_key(&self) -> StateKey {
        StateKey::audit_log(&self.config.namespace, self.config.environment)
    }

    fn snapshot_key(&self, id: &str) -> StateKey {
        StateKey::snapshot(&self.config.namespace, id)
    }

    async fn load_stored(&self) -> Result<Option<RuleSetEnvelope>, PublisherError> {
        match self.state.get(&self.rules_key()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// The stored envelope, or an empty one when nothing is stored.
    pub async fn load(&self) -> Result<RuleSetEnvelope, PublisherError> {
        Ok(self.load_stored().await?.unwrap_or_default())
    }

    async fn persist(&self, envelope: &RuleSetEnvelope) -> Result<(), PublisherError> {
        let raw = serde_json::to_string(envelope)?;
        self.state.set(&self.rules_key(), &raw).await?;
        Ok(())
    }

    async fn store_snapshot(&self, rules: &[Rule]) -> Result<String, PublisherError> {
        let id = uuid::Uuid::new_v4().to_string();
        let raw = serde_json::to_string(rules)?;
        self.state.set(&self.snapshot_key(&id), &raw).await?;
        Ok(id)
    }

    /// The rule list captured with an audit entry.
    pub async fn snapshot(&self, snapshot_id: &str) -> Result<Option<Vec<Rule>>, PublisherError> {
        match self.state.get(&self.snapshot_key(snapshot_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// The audit log, most recent entry first.
    pub async fn audit_log(&self) -> Result<AuditLog, PublisherError> {
        let max = self.config.audit.max_entries;
        match self.state.get(&self.audit_key()).await? {
            Some(raw) => Ok(AuditLog::from_json(&raw, max)?),
            None => Ok(AuditLog::with_capacity(max)?),
        }
    }

    async fn append_audit(&self, entry: AuditEntry) -> Result<(), PublisherError> {
        let mut log = self.audit_log().await?;
        let evicted = log.record(entry);
        self.state.set(&self.audit_key(), &log.to_json()?).await?;

        for old in evicted {
            if let Some(id) = old.snapshot_id {
                debug!(snapshot_id = %id, "dropping snapshot of evicted audit entry");
                self.state.delete(&self.snapshot_key(&id)).await?;
            }
        }
        Ok(())
    }

    /// Persist `rules` as an edit, classified against `old`. The caller
    /// holds the write lock.
    async fn commit(
        &self,
        user: &str,
        old: RuleSetEnvelope,
        rules: Vec<Rule>,
    ) -> Result<AuditEntry, PublisherError> {
        validate_rule_set(&rules)?;

        let classification = self.classifier.classify(&old.rules, &rules);
        let snapshot_id = self.store_snapshot(&rules).await?;
        let envelope = RuleSetEnvelope {
            rules,
            script: old.script,
        };
        self.persist(&envelope).await?;

        let entry = classification.into_entry(user).with_snapshot_id(snapshot_id);
        self.append_audit(entry.clone()).await?;
        info!(action = %entry.action, details = %entry.details, "rules saved");
        Ok(entry)
    }

    /// Replace the whole rule list.
    ///
    /// The list is validated, the change is classified against the stored
    /// list, and a snapshot plus an audit entry are recorded. The published
    /// script is left untouched until the next [`publish`](Self::publish).
    #[instrument(skip_all, fields(env = %self.config.environment, user = %user))]
    pub async fn save_rules(
        &self,
        user: &str,
        rules: Vec<Rule>,
    ) -> Result<AuditEntry, PublisherError> {
        let _guard = self.write_lock.lock().await;
        let old = self.load().await?;
        self.commit(user, old, rules).await
    }

    /// Insert `rule`, or replace the rule with the same id in place.
    #[instrument(skip_all, fields(env = %self.config.environment, user = %user, rule_id = %rule.id))]
    pub async fn upsert_rule(&self, user: &str, rule: Rule) -> Result<AuditEntry, PublisherError> {
        let _guard = self.write_lock.lock().await;
        let old = self.load().await?;
        let mut rules = old.rules.clone();
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
        self.commit(user, old, rules).await
    }

    /// Flip `is_active` on one rule.
    #[instrument(skip_all, fields(env = %self.config.environment, user = %user, rule_id = %id))]
    pub async fn toggle_rule(&self, user: &str, id: &str) -> Result<AuditEntry, PublisherError> {
        let _guard = self.write_lock.lock().await;
        let old = self.load().await?;
        let mut rules = old.rules.clone();
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PublisherError::RuleNotFound(id.to_owned()))?;
        rule.is_active = !rule.is_active;
        self.commit(user, old, rules).await
    }

    /// Remove one rule.
    #[instrument(skip_all, fields(env = %self.config.environment, user = %user, rule_id = %id))]
    pub async fn delete_rule(&self, user: &str, id: &str) -> Result<AuditEntry, PublisherError> {
        let _guard = self.write_lock.lock().await;
        let old = self.load().await?;
        if old.rule(id).is_none() {
            return Err(PublisherError::RuleNotFound(id.to_owned()));
        }
        let rules = old.rules.iter().filter(|r| r.id != id).cloned().collect();
        self.commit(user, old, rules).await
    }

    /// Compile the stored rules, store the script and purge the artifact.
    ///
    /// A failed purge is logged and reported; the publish is not undone.
    #[instrument(skip_all, fields(env = %self.config.environment, user = %user))]
    pub async fn publish(&self, user: &str) -> Result<PublishReport, PublisherError> {
        let _guard = self.write_lock.lock().await;
        let mut envelope = self.load().await?;
        validate_rule_set(&envelope.rules)?;

        let compiled = self.compiler.compile(&envelope.rules)?;
        let placeholder = compiled.is_placeholder();
        envelope.script = compiled.source;
        self.persist(&envelope).await?;

        let snapshot_id = self.store_snapshot(&envelope.rules).await?;
        let entry = self
            .classifier
            .classify_publish(self.config.environment, compiled.rule_count)
            .into_entry(user)
            .with_snapshot_id(snapshot_id);
        self.append_audit(entry.clone()).await?;

        let purge = self.purge_artifact().await;
        info!(
            rule_count = compiled.rule_count,
            placeholder,
            purge_failed = purge.is_failed(),
            "published"
        );
        Ok(PublishReport {
            entry,
            rule_count: compiled.rule_count,
            placeholder,
            purge,
        })
    }

    /// Request a purge of the configured artifact URL.
    pub async fn purge_artifact(&self) -> PurgeStatus {
        let Some(url) = self.config.artifact_url.clone() else {
            debug!("no artifact url configured, skipping purge");
            return PurgeStatus::Skipped;
        };
        match self.purger.purge(&url).await {
            Ok(()) => PurgeStatus::Purged { url },
            Err(e) => {
                warn!(url = %url, error = %e, "cache purge failed");
                PurgeStatus::Failed {
                    url,
                    error: e.to_string(),
                }
            }
        }
    }

    /// The artifact as it should be served right now.
    pub async fn artifact(&self) -> Result<Artifact, PublisherError> {
        let stored = self.load_stored().await?;
        Ok(render_artifact(stored.as_ref()))
    }

    /// Evaluate the stored rules against `ctx` at `now`, with a full trace.
    pub async fn preview(
        &self,
        ctx: &TargetingContext,
        now: DateTime<Utc>,
    ) -> Result<RuleEvaluationTrace, PublisherError> {
        let envelope = self.load().await?;
        Ok(RuleEngine::new(envelope.rules).trace(ctx, now))
    }

    /// Schedule boundaries of stored active rules within the configured
    /// window of `now`. Returns `None` when nothing is stored, otherwise
    /// the number of stored rules and the transitions.
    pub async fn transitions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<(usize, Vec<TransitionRecord>)>, PublisherError> {
        let Some(envelope) = self.load_stored().await? else {
            return Ok(None);
        };
        let detector = TransitionDetector::new(self.config.scheduler.window());
        let records = detector
            .find_transitions(&envelope.rules, now)
            .into_iter()
            .map(|t| TransitionRecord {
                rule_id: t.rule.id.clone(),
                rule_name: t.rule.name.clone(),
                boundary: t.boundary,
                at: t.at,
            })
            .collect();
        Ok(Some((envelope.rules.len(), records)))
    }

    /// Purge the artifact if any stored rule crosses a schedule boundary
    /// near `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, PublisherError> {
        self.sweep_filtered(now, |_| true).await
    }

    /// Like [`sweep`](Self::sweep), considering only transitions for which
    /// `keep` returns `true`.
    #[instrument(skip_all, fields(env = %self.config.environment))]
    pub async fn sweep_filtered<F>(
        &self,
        now: DateTime<Utc>,
        keep: F,
    ) -> Result<SweepReport, PublisherError>
    where
        F: Fn(&TransitionRecord) -> bool + Send,
    {
        let Some((checked, transitions)) = self.transitions(now).await? else {
            debug!("no rules stored");
            return Ok(SweepReport::NoRules);
        };
        let transitions: Vec<TransitionRecord> = transitions.into_iter().filter(|t| keep(t)).collect();
        if transitions.is_empty() {
            debug!(checked, "no rules transitioning");
            return Ok(SweepReport::NoTransitions { checked });
        }

        let purge = self.purge_artifact().await;
        let report = SweepReport::PurgeTriggered { transitions, purge };
        info!(rules = ?report.rule_names(), "purge triggered by rule transition");
        Ok(report)
    }
}

/// Fluent builder for constructing a [`Workspace`].
///
/// A [`StateStore`] must be supplied. The purger defaults to [`LogPurger`]
/// and the configuration to [`PublisherConfig::default`].
#[derive(Default)]
pub struct WorkspaceBuilder {
    state: Option<Arc<dyn StateStore>>,
    purger: Option<Arc<dyn CachePurger>>,
    config: PublisherConfig,
    environment: Option<Environment>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state store implementation.
    #[must_use]
    pub fn state(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state = Some(store);
        self
    }

    /// Set the cache purger.
    #[must_use]
    pub fn purger(mut self, purger: Arc<dyn CachePurger>) -> Self {
        self.purger = Some(purger);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: PublisherConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the configured environment.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Build the workspace.
    pub fn build(self) -> Result<Workspace, PublisherError> {
        let state = self
            .state
            .ok_or_else(|| PublisherError::Configuration("state store is required".into()))?;
        let mut config = self.config;
        if let Some(env) = self.environment {
            config.environment = env;
        }
        config.validate()?;

        Ok(Workspace {
            state,
            purger: self.purger.unwrap_or_else(|| Arc::new(LogPurger)),
            config,
            compiler: ScriptCompiler::new(),
            classifier: ChangeClassifier::new(),
            write_lock: Mutex::new(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use adex_core::{AuditAction, Condition, Operator, TargetKey};
    use adex_state_memory::MemoryStateStore;

    use super::*;
    use crate::testing::RecordingPurger;

    const URL: &str = "https://cdn.example.com/sponsorship_exclusions.js";

    fn rule(id: &str) -> Rule {
        Rule::new(id, format!("Rule {id}"), format!(".slot-{id}"))
            .with_condition(Condition::new(TargetKey::Site, Operator::Equals, "gol"))
    }

    fn workspace() -> (Workspace, Arc<MemoryStateStore>, Arc<RecordingPurger>) {
        let state = Arc::new(MemoryStateStore::new());
        let purger = Arc::new(RecordingPurger::new());
        let config = PublisherConfig {
            artifact_url: Some(URL.to_owned()),
            ..PublisherConfig::default()
        };
        let ws = WorkspaceBuilder::new()
            .state(state.clone())
            .purger(purger.clone())
            .config(config)
            .build()
            .unwrap();
        (ws, state, purger)
    }

    #[tokio::test]
    async fn builder_requires_state() {
        let err = WorkspaceBuilder::new().build().unwrap_err();
        assert!(matches!(err, PublisherError::Configuration(_)));
    }

    #[tokio::test]
    async fn empty_workspace() {
        let (ws, _, _) = workspace();
        assert!(ws.load().await.unwrap().rules.is_empty());
        assert!(ws.audit_log().await.unwrap().is_empty());
        assert!(!ws.artifact().await.unwrap().is_live());
        assert_eq!(ws.sweep(Utc::now()).await.unwrap(), SweepReport::NoRules);
    }

    #[tokio::test]
    async fn edits_are_classified_and_snapshotted() {
        let (ws, _, _) = workspace();

        let created = ws.upsert_rule("ana", rule("a")).await.unwrap();
        assert_eq!(created.action, AuditAction::Create);
        assert_eq!(created.user, "ana");

        let toggled = ws.toggle_rule("ana", "a").await.unwrap();
        assert_eq!(toggled.action, AuditAction::Toggle);
        assert!(!ws.load().await.unwrap().rules[0].is_active);

        let updated = ws
            .upsert_rule("ana", rule("a").with_active(false).with_respect_ads_enabled(false))
            .await
            .unwrap();
        assert_eq!(updated.action, AuditAction::Update);

        let deleted = ws.delete_rule("ana", "a").await.unwrap();
        assert_eq!(deleted.action, AuditAction::Delete);

        let log = ws.audit_log().await.unwrap();
        let actions: Vec<AuditAction> = log.entries().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::Delete,
                AuditAction::Update,
                AuditAction::Toggle,
                AuditAction::Create
            ]
        );

        let snap = ws
            .snapshot(created.snapshot_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, "a");
    }

    #[tokio::test]
    async fn invalid_rules_are_rejected_before_storage() {
        let (ws, state, _) = workspace();
        let bad = Rule::new("x", "no conditions", ".x");
        let err = ws.save_rules("ana", vec![bad]).await.unwrap_err();
        assert!(matches!(err, PublisherError::Invalid(_)));
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn missing_rule() {
        let (ws, _, _) = workspace();
        assert!(matches!(
            ws.toggle_rule("ana", "nope").await,
            Err(PublisherError::RuleNotFound(_))
        ));
        assert!(matches!(
            ws.delete_rule("ana", "nope").await,
            Err(PublisherError::RuleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn save_keeps_published_script() {
        let (ws, _, _) = workspace();
        ws.save_rules("ana", vec![rule("a")]).await.unwrap();
        ws.publish("ana").await.unwrap();
        let script = ws.load().await.unwrap().script;

        ws.save_rules("ana", vec![rule("a"), rule("b")]).await.unwrap();
        assert_eq!(ws.load().await.unwrap().script, script);
    }

    #[tokio::test]
    async fn publish_compiles_and_purges() {
        let (ws, _, purger) = workspace();
        ws.save_rules("ana", vec![rule("a"), rule("b").with_active(false)])
            .await
            .unwrap();

        let report = ws.publish("ana").await.unwrap();
        assert_eq!(report.rule_count, 1);
        assert!(!report.placeholder);
        assert_eq!(report.entry.action, AuditAction::PublishProd);
        assert_eq!(report.purge, PurgeStatus::Purged { url: URL.to_owned() });
        assert_eq!(purger.urls(), vec![URL.to_owned()]);

        let artifact = ws.artifact().await.unwrap();
        assert!(artifact.is_live());
        assert!(artifact.body.contains(".slot-a"));
        assert!(!artifact.body.contains(".slot-b"));
    }

    #[tokio::test]
    async fn purge_failure_does_not_undo_publish() {
        let (ws, _, purger) = workspace();
        purger.set_failing(true);
        ws.save_rules("ana", vec![rule("a")]).await.unwrap();

        let report = ws.publish("ana").await.unwrap();
        assert!(report.purge.is_failed());
        assert!(ws.artifact().await.unwrap().is_live());
    }

    #[tokio::test]
    async fn dev_environment_is_isolated() {
        let state = Arc::new(MemoryStateStore::new());
        let prod = WorkspaceBuilder::new().state(state.clone()).build().unwrap();
        let dev = WorkspaceBuilder::new()
            .state(state.clone())
            .environment(Environment::Dev)
            .build()
            .unwrap();

        dev.save_rules("ana", vec![rule("a")]).await.unwrap();
        let report = dev.publish("ana").await.unwrap();
        assert_eq!(report.entry.action, AuditAction::PublishDev);
        assert_eq!(report.purge, PurgeStatus::Skipped);

        assert!(prod.load().await.unwrap().rules.is_empty());
        assert!(!prod.artifact().await.unwrap().is_live());
        assert!(dev.artifact().await.unwrap().is_live());
    }

    #[tokio::test]
    async fn evicted_audit_entries_drop_their_snapshots() {
        let state = Arc::new(MemoryStateStore::new());
        let mut config = PublisherConfig::default();
        config.audit.max_entries = 2;
        let ws = WorkspaceBuilder::new()
            .state(state.clone())
            .config(config)
            .build()
            .unwrap();

        let first = ws.save_rules("ana", vec![rule("a")]).await.unwrap();
        ws.toggle_rule("ana", "a").await.unwrap();
        ws.toggle_rule("ana", "a").await.unwrap();

        assert_eq!(ws.audit_log().await.unwrap().len(), 2);
        let snap = first.snapshot_id.unwrap();
        assert!(ws.snapshot(&snap).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_purges_on_transition() {
        let (ws, _, purger) = workspace();
        let now = Utc::now();
        ws.save_rules(
            "ana",
            vec![
                rule("a").with_schedule(None, Some(now - Duration::seconds(30))),
                rule("b").with_schedule(Some(now - Duration::hours(1)), None),
            ],
        )
        .await
        .unwrap();

        let report = ws.sweep(now).await.unwrap();
        assert_eq!(report.rule_names(), vec!["Rule a"]);
        assert_eq!(purger.count(), 1);

        let later = now + Duration::minutes(10);
        assert_eq!(
            ws.sweep(later).await.unwrap(),
            SweepReport::NoTransitions { checked: 2 }
        );
        assert_eq!(purger.count(), 1);
    }

    #[tokio::test]
    async fn preview_uses_stored_rules() {
        let (ws, _, _) = workspace();
        ws.save_rules("ana", vec![rule("a").with_respect_ads_enabled(false)])
            .await
            .unwrap();
        let ctx = TargetingContext::new().with(TargetKey::Site, "GOL");
        let trace = ws.preview(&ctx, Utc::now()).await.unwrap();
        assert_eq!(trace.matched_rules, vec!["Rule a"]);
    }

    struct UnavailableStore;

    #[async_trait::async_trait]
    impl StateStore for UnavailableStore {
        async fn get(&self, _key: &StateKey) -> Result<Option<String>, adex_state::StateError> {
            Err(adex_state::StateError::Backend("connection refused".into()))
        }

        async fn set(&self, _key: &StateKey, _value: &str) -> Result<(), adex_state::StateError> {
            Err(adex_state::StateError::Backend("connection refused".into()))
        }

        async fn delete(&self, _key: &StateKey) -> Result<bool, adex_state::StateError> {
            Err(adex_state::StateError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_state_errors() {
        let ws = WorkspaceBuilder::new()
            .state(Arc::new(UnavailableStore))
            .build()
            .unwrap();
        let err = ws.load().await.unwrap_err();
        assert!(matches!(err, PublisherError::State(_)));
        assert_eq!(err.to_string(), "state error: backend error: connection refused");
        assert!(ws.save_rules("editor", vec![rule("a")]).await.is_err());
    }
}
