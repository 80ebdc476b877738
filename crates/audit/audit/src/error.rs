/// Errors that can occur while loading or storing the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The log was configured to keep no entries.
    #[error("audit log capacity must be at least 1")]
    ZeroCapacity,
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
