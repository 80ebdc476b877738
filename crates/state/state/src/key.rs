use serde::{Deserialize, Serialize};

use adex_core::Environment;

/// The kind of value being stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// A `RuleSetEnvelope` (rules plus last compiled script).
    Rules,
    /// The capped audit log.
    AuditLog,
    /// A point-in-time copy of a rule list.
    Snapshot,
    Custom(String),
}

impl KeyKind {
    /// Return a string representation of the key kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rules => "rules",
            Self::AuditLog => "audit_log",
            Self::Snapshot => "snapshot",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to address entries in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub namespace: String,
    pub kind: KeyKind,
    pub id: String,
}

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            id: id.into(),
        }
    }

    /// Key of the rule-set envelope for `env`.
    #[must_use]
    pub fn rules(namespace: impl Into<String>, env: Environment) -> Self {
        Self::new(namespace, KeyKind::Rules, env.storage_key())
    }

    /// Key of the audit log for `env`.
    #[must_use]
    pub fn audit_log(namespace: impl Into<String>, env: Environment) -> Self {
        Self::new(namespace, KeyKind::AuditLog, env.as_str())
    }

    /// Key of a rule-list snapshot.
    #[must_use]
    pub fn snapshot(namespace: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self::new(namespace, KeyKind::Snapshot, snapshot_id)
    }

    /// Return a canonical string representation: `namespace:kind:id`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}:{}", self.namespace, self.kind, self.id)
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_kind_as_str() {
        assert_eq!(KeyKind::Rules.as_str(), "rules");
        assert_eq!(KeyKind::AuditLog.as_str(), "audit_log");
        assert_eq!(KeyKind::Snapshot.as_str(), "snapshot");
        assert_eq!(KeyKind::Custom("foo".into()).as_str(), "foo");
    }

    #[test]
    fn state_key_canonical() {
        assert_eq!(
            StateKey::rules("adex", Environment::Prod).canonical(),
            "adex:rules:rules_data"
        );
        assert_eq!(
            StateKey::rules("adex", Environment::Dev).canonical(),
            "adex:rules:rules_data_dev"
        );
        assert_eq!(
            StateKey::audit_log("adex", Environment::Dev).to_string(),
            "adex:audit_log:dev"
        );
        assert_eq!(StateKey::snapshot("adex", "s1").canonical(), "adex:snapshot:s1");
    }
}
