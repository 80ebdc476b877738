use thiserror::Error;

use crate::validation::ValidationIssue;

/// Errors raised by core type handling.
#[derive(Debug, Error)]
pub enum AdexError {
    /// The rule set failed boundary validation.
    #[error("invalid rule set: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
