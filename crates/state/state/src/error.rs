use thiserror::Error;

/// Errors from state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// The backend failed to read or write a value.
    #[error("backend error: {0}")]
    Backend(String),
}
