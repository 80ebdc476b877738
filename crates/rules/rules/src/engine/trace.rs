use serde::{Deserialize, Serialize};

use adex_core::{Condition, Rule};

use crate::engine::condition::ConditionResult;
use crate::engine::matcher::RuleMatch;

/// Result of evaluating a single rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleTraceResult {
    /// The rule fired.
    Matched,
    /// The rule's conditions did not hold.
    NotMatched,
    /// The rule was skipped (inactive, ads disabled or out of schedule).
    Skipped,
}

impl RuleTraceResult {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotMatched => "not_matched",
            Self::Skipped => "skipped",
        }
    }
}

/// Trace of one condition within a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionTrace {
    /// Human-readable form, e.g. `keywords contains "rukomet"`.
    pub condition_display: String,
    pub matched: bool,
    pub matched_tokens: Vec<String>,
}

impl ConditionTrace {
    fn new(condition: &Condition, result: &ConditionResult) -> Self {
        Self {
            condition_display: display_condition(condition),
            matched: result.matched,
            matched_tokens: result.matched_tokens.clone(),
        }
    }
}

/// Trace entry for a single rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTraceEntry {
    pub rule_id: String,
    pub rule_name: String,
    /// Whether the rule is active.
    pub enabled: bool,
    /// `"AND"` or `"OR"`.
    pub logical_operator: String,
    /// `"hide"` or `"show"`.
    pub action: String,
    pub selector: String,
    pub result: RuleTraceResult,
    /// Reason the rule was skipped, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Per-condition results in condition order (empty when skipped).
    pub conditions: Vec<ConditionTrace>,
    /// Matched tokens across all satisfied conditions.
    pub matched_tokens: Vec<String>,
}

impl RuleTraceEntry {
    pub(crate) fn new(rule: &Rule, outcome: &RuleMatch) -> Self {
        let result = if outcome.skipped.is_some() {
            RuleTraceResult::Skipped
        } else if outcome.fired {
            RuleTraceResult::Matched
        } else {
            RuleTraceResult::NotMatched
        };

        Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            enabled: rule.is_active,
            logical_operator: rule.logical_operator.as_str().to_owned(),
            action: rule.action.as_str().to_owned(),
            selector: rule.target_element_selector.clone(),
            result,
            skip_reason: outcome.skipped.map(|r| r.as_str().to_owned()),
            conditions: rule
                .conditions
                .iter()
                .zip(&outcome.conditions)
                .map(|(c, r)| ConditionTrace::new(c, r))
                .collect(),
            matched_tokens: outcome.trace.clone(),
        }
    }
}

/// Complete trace of a rule set evaluated against one targeting context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluationTrace {
    /// Names of the rules that fired, in list order.
    pub matched_rules: Vec<String>,
    /// Number of rules whose conditions were actually evaluated.
    pub total_rules_evaluated: usize,
    /// Number of rules that were skipped.
    pub total_rules_skipped: usize,
    /// Total wall-clock time for the evaluation in microseconds.
    pub evaluation_duration_us: u64,
    /// Per-rule trace entries in list order.
    pub trace: Vec<RuleTraceEntry>,
}

fn display_condition(condition: &Condition) -> String {
    let cs = if condition.case_sensitive {
        " (case-sensitive)"
    } else {
        ""
    };
    format!(
        "{} {} {:?}{cs}",
        condition.target_key, condition.operator, condition.value
    )
}
