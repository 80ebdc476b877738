use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use adex_core::{AuditAction, AuditEntry, Environment, Rule};

/// Action label and human-readable text describing one change.
///
/// Id, timestamp, user and snapshot are assigned by the caller through
/// [`Classification::into_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: AuditAction,
    pub details: String,
    /// The rule the change is about, when there is one.
    pub rule_id: Option<String>,
}

impl Classification {
    fn new(action: AuditAction, details: String, rule_id: Option<&str>) -> Self {
        Self {
            action,
            details,
            rule_id: rule_id.map(str::to_owned),
        }
    }

    /// Turn the classification into an audit entry for `user`.
    pub fn into_entry(self, user: impl Into<String>) -> AuditEntry {
        AuditEntry::new(user, self.action, self.details)
    }
}

/// Describes the difference between two versions of a rule list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeClassifier;

impl ChangeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Entry for publishing `rule_count` active rules to `env`.
    pub fn classify_publish(&self, env: Environment, rule_count: usize) -> Classification {
        Classification::new(
            env.publish_action(),
            format!("Published {rule_count} active rule(s) to {env}"),
            None,
        )
    }

    /// Classify the change from `old` to `new`.
    ///
    /// The first matching case wins: a new id is a create, a missing id is
    /// a delete, a content difference is an update and an `is_active` flip
    /// is a toggle. Anything else (e.g. a reorder) is a generic update.
    #[instrument(skip_all, fields(old = old.len(), new = new.len()))]
    pub fn classify(&self, old: &[Rule], new: &[Rule]) -> Classification {
        let classification = classify_edit(old, new);
        debug!(action = %classification.action, details = %classification.details, "classified change");
        classification
    }
}

fn classify_edit(old: &[Rule], new: &[Rule]) -> Classification {
    let old_ids: HashSet<&str> = old.iter().map(|r| r.id.as_str()).collect();
    let new_ids: HashSet<&str> = new.iter().map(|r| r.id.as_str()).collect();

    if let Some(rule) = new.iter().find(|r| !old_ids.contains(r.id.as_str())) {
        return Classification::new(
            AuditAction::Create,
            format!("Created rule '{}' ({})", rule.name, rule.id),
            Some(&rule.id),
        );
    }

    if let Some(rule) = old.iter().find(|r| !new_ids.contains(r.id.as_str())) {
        return Classification::new(
            AuditAction::Delete,
            format!("Deleted rule '{}' ({})", rule.name, rule.id),
            Some(&rule.id),
        );
    }

    let old_by_id: HashMap<&str, &Rule> = old.iter().map(|r| (r.id.as_str(), r)).collect();
    let pairs: Vec<(&Rule, &Rule)> = new
        .iter()
        .filter_map(|n| old_by_id.get(n.id.as_str()).map(|o| (*o, n)))
        .collect();

    if let Some((_, rule)) = pairs.iter().find(|(o, n)| !o.content_eq(n)) {
        return Classification::new(
            AuditAction::Update,
            format!("Updated rule '{}' ({})", rule.name, rule.id),
            Some(&rule.id),
        );
    }

    if let Some((_, rule)) = pairs.iter().find(|(o, n)| o.is_active != n.is_active) {
        let state = if rule.is_active { "active" } else { "inactive" };
        return Classification::new(
            AuditAction::Toggle,
            format!("Rule '{}' ({}) is now {state}", rule.name, rule.id),
            Some(&rule.id),
        );
    }

    Classification::new(AuditAction::Update, "Rule list re-saved".to_owned(), None)
}
