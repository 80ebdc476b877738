use thiserror::Error;

/// Errors that can occur while editing, publishing or sweeping a workspace.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// The rule set was rejected at the boundary.
    #[error(transparent)]
    Invalid(#[from] adex_core::AdexError),

    /// An error occurred in the state store.
    #[error("state error: {0}")]
    State(#[from] adex_state::StateError),

    /// Compiling the script failed.
    #[error("rule error: {0}")]
    Rule(#[from] adex_rules::RuleError),

    /// The audit log could not be read or written.
    #[error("audit error: {0}")]
    Audit(#[from] adex_audit::AuditError),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No rule with the given id exists.
    #[error("rule not found: {0}")]
    RuleNotFound(String),

    /// The cache purge request failed.
    #[error("purge failed: {0}")]
    Purge(String),

    /// The publisher was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}
