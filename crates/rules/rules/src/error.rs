use thiserror::Error;

/// Errors that can occur while compiling rules into a script or reading one
/// back.
///
/// Evaluation itself never fails: malformed conditions simply do not match.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to serialize compiled rules: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("script does not carry an embedded rule payload")]
    MissingPayload,
}
