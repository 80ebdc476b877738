use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// The persisted unit per environment: the editable rule list plus the last
/// compiled artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetEnvelope {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub script: String,
}

impl RuleSetEnvelope {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            script: String::new(),
        }
    }

    /// Whether at least one rule is active.
    pub fn has_active_rules(&self) -> bool {
        self.rules.iter().any(|r| r.is_active)
    }

    /// The active rules, in list order.
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_active)
    }

    /// Find a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}
