pub mod condition;
pub mod executor;
pub mod matcher;
pub mod trace;

pub use condition::{ConditionResult, evaluate_condition, normalize};
pub use executor::{FiredRule, RuleEngine};
pub use matcher::{RuleMatch, SkipReason, match_rule};
