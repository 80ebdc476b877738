use serde::{Deserialize, Serialize};

use adex_core::{LogicalOperator, Rule, TargetingContext};

use crate::engine::condition::{ConditionResult, evaluate_condition};

/// Why a rule was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The rule is switched off.
    Inactive,
    /// The rule requires `ads_enabled` and the page has ads disabled.
    AdsDisabled,
    /// The evaluation time is outside the rule's start/end dates.
    NotScheduled,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::AdsDisabled => "ads_disabled",
            Self::NotScheduled => "not_scheduled",
        }
    }
}

/// Result of matching one rule against a context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Whether the rule fires.
    pub fired: bool,
    /// Matched tokens of every satisfied condition, in condition order.
    pub trace: Vec<String>,
    /// Per-condition results, parallel to `rule.conditions`. Empty when the
    /// rule was skipped.
    pub conditions: Vec<ConditionResult>,
    /// Set when a gate short-circuited evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl RuleMatch {
    pub(crate) fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Match a rule against a targeting context.
///
/// Inactive rules and rules gated on `ads_enabled` short-circuit without
/// evaluating conditions. A rule without conditions never fires.
pub fn match_rule(rule: &Rule, ctx: &TargetingContext) -> RuleMatch {
    if !rule.is_active {
        return RuleMatch::skipped(SkipReason::Inactive);
    }
    if rule.respect_ads_enabled && !ctx.ads_enabled {
        return RuleMatch::skipped(SkipReason::AdsDisabled);
    }

    let conditions: Vec<ConditionResult> = rule
        .conditions
        .iter()
        .map(|c| evaluate_condition(c, ctx))
        .collect();

    let fired = !conditions.is_empty()
        && match rule.logical_operator {
            LogicalOperator::And => conditions.iter().all(|r| r.matched),
            LogicalOperator::Or => conditions.iter().any(|r| r.matched),
        };

    let trace = conditions
        .iter()
        .filter(|r| r.matched)
        .flat_map(|r| r.matched_tokens.iter().cloned())
        .collect();

    RuleMatch {
        fired,
        trace,
        conditions,
        skipped: None,
    }
}

#[cfg(test)]
mod tests {
    use adex_core::{Condition, Operator, TargetKey};

    use super::*;

    fn page() -> TargetingContext {
        TargetingContext::new()
            .with(TargetKey::Section, "ostali-sportovi")
            .with_keywords(["Rukomet", "Euro 2026"])
            .with_ads_enabled(true)
    }

    fn holds() -> Condition {
        Condition::new(TargetKey::Section, Operator::Equals, "ostali-sportovi")
    }

    fn fails() -> Condition {
        Condition::new(TargetKey::Section, Operator::Equals, "vijesti")
    }

    fn rule(conds: Vec<Condition>, op: LogicalOperator) -> Rule {
        let mut rule = Rule::new("r", "r", ".x").with_logical_operator(op);
        rule.conditions = conds;
        rule
    }

    #[test]
    fn and_or_truth_table() {
        let mixed = vec![holds(), fails()];
        assert!(!match_rule(&rule(mixed.clone(), LogicalOperator::And), &page()).fired);
        assert!(match_rule(&rule(mixed, LogicalOperator::Or), &page()).fired);

        let both = vec![holds(), holds()];
        assert!(match_rule(&rule(both.clone(), LogicalOperator::And), &page()).fired);
        assert!(match_rule(&rule(both, LogicalOperator::Or), &page()).fired);

        let none = vec![fails(), fails()];
        assert!(!match_rule(&rule(none.clone(), LogicalOperator::And), &page()).fired);
        assert!(!match_rule(&rule(none, LogicalOperator::Or), &page()).fired);
    }

    #[test]
    fn ads_gate_overrides_conditions() {
        let r = rule(vec![holds()], LogicalOperator::And);
        let ctx = page().with_ads_enabled(false);
        let m = match_rule(&r, &ctx);
        assert!(!m.fired);
        assert_eq!(m.skipped, Some(SkipReason::AdsDisabled));
        assert!(m.conditions.is_empty());

        let r = r.with_respect_ads_enabled(false);
        assert!(match_rule(&r, &ctx).fired);
    }

    #[test]
    fn ads_gate_requires_boolean_true() {
        let r = Rule::new("r", "r", ".x")
            .with_condition(Condition::new(TargetKey::Section, Operator::Equals, "sport"));

        let ctx: TargetingContext =
            serde_json::from_str(r#"{"section":"sport","ads_enabled":"true"}"#).unwrap();
        let m = match_rule(&r, &ctx);
        assert!(!m.fired);
        assert_eq!(m.skipped, Some(SkipReason::AdsDisabled));

        let ctx: TargetingContext =
            serde_json::from_str(r#"{"section":"sport","ads_enabled":true}"#).unwrap();
        assert!(match_rule(&r, &ctx).fired);
    }

    #[test]
    fn inactive_rules_never_fire() {
        let r = rule(vec![holds()], LogicalOperator::And).with_active(false);
        let m = match_rule(&r, &page());
        assert!(!m.fired);
        assert_eq!(m.skipped, Some(SkipReason::Inactive));
    }

    #[test]
    fn trace_concatenates_satisfied_conditions() {
        let r = rule(
            vec![
                Condition::new(TargetKey::Keywords, Operator::Contains, "rukomet,euro 2026"),
                fails(),
                holds(),
            ],
            LogicalOperator::Or,
        );
        let m = match_rule(&r, &page());
        assert!(m.fired);
        assert_eq!(m.trace, vec!["rukomet", "euro 2026", "ostali-sportovi"]);
        assert_eq!(m.conditions.len(), 3);
        assert!(!m.conditions[1].matched);
    }

    #[test]
    fn negative_operator_fires_with_empty_trace() {
        let r = rule(
            vec![Condition::new(TargetKey::Section, Operator::NotEquals, "vijesti")],
            LogicalOperator::And,
        );
        let m = match_rule(&r, &page());
        assert!(m.fired);
        assert!(m.trace.is_empty());
    }

    #[test]
    fn malformed_condition_degrades_alone() {
        let r = rule(
            vec![
                Condition::new(TargetKey::Unknown, Operator::Equals, "x"),
                Condition::new(TargetKey::Section, Operator::Unknown, "x"),
                holds(),
            ],
            LogicalOperator::Or,
        );
        let m = match_rule(&r, &page());
        assert!(m.fired);
        assert_eq!(
            m.conditions.iter().map(|c| c.matched).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[test]
    fn rule_without_conditions_never_fires() {
        let r = rule(Vec::new(), LogicalOperator::And);
        assert!(!match_rule(&r, &page()).fired);
    }

    #[test]
    fn handball_page_end_to_end() {
        let r = rule(
            vec![
                Condition::new(TargetKey::Keywords, Operator::Contains, "rukomet")
                    .with_case_sensitive(false),
            ],
            LogicalOperator::And,
        )
        .with_respect_ads_enabled(true);
        let m = match_rule(&r, &page());
        assert!(m.fired);
        assert!(m.trace.contains(&"rukomet".to_owned()));
    }
}
