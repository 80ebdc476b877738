use serde::{Deserialize, Serialize};
use tracing::debug;

use adex_core::AuditEntry;

use crate::error::AuditError;

/// Number of entries kept by default.
pub const DEFAULT_MAX_ENTRIES: usize = 30;

/// Append-only audit log, most recent entry first, capped in length.
///
/// Serialized as a plain JSON array so the stored form stays a simple list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    #[serde(skip, default = "default_max")]
    max_entries: usize,
}

fn default_max() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log keeping at most `max_entries` entries.
    pub fn with_capacity(max_entries: usize) -> Result<Self, AuditError> {
        if max_entries == 0 {
            return Err(AuditError::ZeroCapacity);
        }
        Ok(Self {
            entries: Vec::new(),
            max_entries,
        })
    }

    /// Parse a stored log and apply the cap.
    pub fn from_json(raw: &str, max_entries: usize) -> Result<Self, AuditError> {
        let mut log = Self::with_capacity(max_entries)?;
        log.entries = serde_json::from_str(raw)?;
        log.entries.truncate(max_entries);
        Ok(log)
    }

    /// Serialize the log for storage.
    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Add an entry at the front and return the entries evicted past the
    /// cap, oldest last.
    pub fn record(&mut self, entry: AuditEntry) -> Vec<AuditEntry> {
        debug!(action = %entry.action, user = %entry.user, "recording audit entry");
        self.entries.insert(0, entry);
        if self.entries.len() > self.max_entries {
            self.entries.split_off(self.max_entries)
        } else {
            Vec::new()
        }
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}
