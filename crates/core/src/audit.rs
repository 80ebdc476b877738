use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Delete,
    Update,
    Toggle,
    PublishDev,
    PublishProd,
}

impl AuditAction {
    /// Return the wire name of the action (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Toggle => "TOGGLE",
            Self::PublishDev => "PUBLISH_DEV",
            Self::PublishProd => "PUBLISH_PROD",
        }
    }

    /// Whether the entry records a publish rather than an edit.
    #[must_use]
    pub fn is_publish(&self) -> bool {
        matches!(self, Self::PublishDev | Self::PublishProd)
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// When the change was recorded (epoch milliseconds on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Who made the change.
    pub user: String,
    /// What kind of change it was.
    pub action: AuditAction,
    /// Human-readable description.
    pub details: String,
    /// Point-in-time copy of the rule list taken with this change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

impl AuditEntry {
    /// Create an entry stamped with a fresh id and the current time.
    pub fn new(user: impl Into<String>, action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user: user.into(),
            action,
            details: details.into(),
            snapshot_id: None,
        }
    }

    /// Attach the snapshot id.
    #[must_use]
    pub fn with_snapshot_id(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    /// Override the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
