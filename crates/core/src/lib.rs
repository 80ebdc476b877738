pub mod audit;
pub mod envelope;
pub mod environment;
pub mod error;
pub mod rule;
pub mod targeting;
pub mod validation;

pub use audit::{AuditAction, AuditEntry};
pub use envelope::RuleSetEnvelope;
pub use environment::Environment;
pub use error::AdexError;
pub use rule::{Condition, ElementAction, LogicalOperator, Operator, Rule};
pub use targeting::{FieldValue, TargetKey, TargetingContext};
pub use validation::{ValidationIssue, validate_rule, validate_rule_set};
