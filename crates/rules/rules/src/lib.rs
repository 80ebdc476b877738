//! Rule evaluation, script compilation and schedule transition detection.
//!
//! [`evaluate_condition`] and [`match_rule`] are the reference semantics.
//! [`ScriptCompiler`] ships the same semantics to the page as a fixed
//! interpreter plus rule data, and [`TransitionDetector`] tells the
//! scheduler when a rule crosses its start or end date.

pub mod compiler;
pub mod engine;
pub mod error;
pub mod schedule;

pub use compiler::{
    CompiledRule, CompiledScript, NO_RULES_PLACEHOLDER, ScriptCompiler, extract_payload,
    is_placeholder,
};
pub use engine::trace::{ConditionTrace, RuleEvaluationTrace, RuleTraceEntry, RuleTraceResult};
pub use engine::{
    ConditionResult, FiredRule, RuleEngine, RuleMatch, SkipReason, evaluate_condition, match_rule,
};
pub use error::RuleError;
pub use schedule::{
    Boundary, DEFAULT_TRANSITION_WINDOW_SECS, Transition, TransitionDetector, find_transitioning,
};
