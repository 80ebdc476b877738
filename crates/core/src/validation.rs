//! Validation applied once when a rule set enters the system.
//!
//! The evaluator tolerates malformed rules on its own (they simply never
//! match), so these checks exist to reject bad edits early and to give the
//! operator a complete list of what is wrong.

use std::collections::HashSet;

use crate::error::AdexError;
use crate::rule::{Operator, Rule};
use crate::targeting::TargetKey;

/// Characters that would let a selector escape its CSS block or the
/// surrounding `<style>` element.
const FORBIDDEN_SELECTOR_CHARS: [char; 3] = ['{', '}', '<'];

/// A single problem found in a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Id of the offending rule (may be empty when the id itself is missing).
    pub rule_id: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(rule: &Rule, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule '{}': {}", self.rule_id, self.message)
    }
}

/// Collect every problem with a single rule.
pub fn validate_rule(rule: &Rule) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if rule.id.trim().is_empty() {
        issues.push(ValidationIssue::new(rule, "missing id"));
    }
    if rule.name.trim().is_empty() {
        issues.push(ValidationIssue::new(rule, "missing name"));
    }
    if rule.conditions.is_empty() {
        issues.push(ValidationIssue::new(rule, "at least one condition is required"));
    }
    for (idx, cond) in rule.conditions.iter().enumerate() {
        if cond.target_key == TargetKey::Unknown {
            issues.push(ValidationIssue::new(
                rule,
                format!("condition {idx}: unknown targeting key"),
            ));
        }
        if cond.operator == Operator::Unknown {
            issues.push(ValidationIssue::new(
                rule,
                format!("condition {idx}: unknown operator"),
            ));
        }
        if cond.tokens().next().is_none() {
            issues.push(ValidationIssue::new(
                rule,
                format!("condition {idx}: value is empty"),
            ));
        }
    }

    let selector = rule.target_element_selector.trim();
    if selector.is_empty() {
        issues.push(ValidationIssue::new(rule, "missing target element selector"));
    } else if selector.contains(&FORBIDDEN_SELECTOR_CHARS[..]) {
        issues.push(ValidationIssue::new(
            rule,
            "target element selector may not contain '{', '}' or '<'",
        ));
    }

    if let (Some(start), Some(end)) = (rule.start_date, rule.end_date)
        && end < start
    {
        issues.push(ValidationIssue::new(rule, "end date precedes start date"));
    }

    issues
}

/// Validate a whole rule set, including id uniqueness.
pub fn validate_rule_set(rules: &[Rule]) -> Result<(), AdexError> {
    let mut issues = Vec::new();
    let mut seen = HashSet::with_capacity(rules.len());

    for rule in rules {
        issues.extend(validate_rule(rule));
        if !rule.id.is_empty() && !seen.insert(rule.id.as_str()) {
            issues.push(ValidationIssue::new(rule, "duplicate id"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AdexError::Validation(issues))
    }
}
