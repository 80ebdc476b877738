pub mod classify;
pub mod error;
pub mod log;

pub use classify::{ChangeClassifier, Classification};
pub use error::AuditError;
pub use log::{AuditLog, DEFAULT_MAX_ENTRIES};
