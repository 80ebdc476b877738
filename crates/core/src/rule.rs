use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::targeting::TargetKey;

/// Comparison applied between a targeting signal and a condition's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    /// Any operator this build does not recognize. Never matches.
    #[serde(other)]
    Unknown,
}

impl Operator {
    /// Return the wire name of the operator (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Unknown => "unknown",
        }
    }

    /// The operator with the opposite outcome (`Equals` <-> `NotEquals`,
    /// `Contains` <-> `NotContains`). `Unknown` stays `Unknown`.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Equals => Self::NotEquals,
            Self::NotEquals => Self::Equals,
            Self::Contains => Self::NotContains,
            Self::NotContains => Self::Contains,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Whether this is one of the negative operators.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::NotEquals | Self::NotContains)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic comparison between a targeting signal and candidate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Targeting signal the condition reads.
    pub target_key: TargetKey,
    /// Comparison to apply.
    pub operator: Operator,
    /// Comma-separated candidate tokens.
    pub value: String,
    /// Compare without lowercasing when `true`.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    /// Create a case-insensitive condition.
    pub fn new(target_key: TargetKey, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            target_key,
            operator,
            value: value.into(),
            case_sensitive: false,
        }
    }

    /// Set case sensitivity.
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Split `value` into trimmed candidate tokens, in order.
    ///
    /// Tokens that are empty after trimming (e.g. from a trailing comma) are
    /// dropped.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.value.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Return a copy of this condition with the operator negated.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            operator: self.operator.negate(),
            ..self.clone()
        }
    }
}

/// How a rule's condition results are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// Every condition must hold.
    #[default]
    #[serde(rename = "AND")]
    And,
    /// At least one condition must hold.
    #[serde(rename = "OR")]
    Or,
}

impl LogicalOperator {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// What happens to the target element when a rule fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementAction {
    #[default]
    Hide,
    Show,
}

impl ElementAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Show => "show",
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// An exclusion/inclusion rule.
///
/// Rules are keyed by `id`, which is assigned once when the rule is created
/// and preserved across edits. Timestamps are stored as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique, never-reused identifier.
    pub id: String,
    /// Human-readable name shown in the editor and the audit log.
    pub name: String,
    /// Conditions evaluated in order.
    pub conditions: Vec<Condition>,
    /// How condition results combine.
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    /// CSS selector of the element the rule hides or shows.
    pub target_element_selector: String,
    /// Hide or show the element.
    #[serde(default)]
    pub action: ElementAction,
    /// Inactive rules never fire and are not compiled.
    #[serde(default)]
    pub is_active: bool,
    /// Require `ads_enabled == true` in the page context.
    #[serde(default)]
    pub respect_ads_enabled: bool,
    /// Creation time.
    #[serde(with = "chrono::serde::ts_milliseconds", default = "epoch")]
    pub created_at: DateTime<Utc>,
    /// Optional start of the rule's schedule.
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    /// Optional end of the rule's schedule.
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
}

impl Rule {
    /// Create a new active rule with no conditions.
    ///
    /// Defaults to `AND`, `Hide`, `respect_ads_enabled = true` and
    /// `created_at = now`, mirroring a freshly created rule in the editor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_element_selector: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            conditions: Vec::new(),
            logical_operator: LogicalOperator::And,
            target_element_selector: target_element_selector.into(),
            action: ElementAction::Hide,
            is_active: true,
            respect_ads_enabled: true,
            created_at: Utc::now(),
            start_date: None,
            end_date: None,
        }
    }

    /// Append a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the logical operator.
    #[must_use]
    pub fn with_logical_operator(mut self, op: LogicalOperator) -> Self {
        self.logical_operator = op;
        self
    }

    /// Set the element action.
    #[must_use]
    pub fn with_action(mut self, action: ElementAction) -> Self {
        self.action = action;
        self
    }

    /// Set the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Set whether the rule requires `ads_enabled`.
    #[must_use]
    pub fn with_respect_ads_enabled(mut self, respect: bool) -> Self {
        self.respect_ads_enabled = respect;
        self
    }

    /// Set the creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the schedule bounds.
    #[must_use]
    pub fn with_schedule(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Whether `now` falls inside the rule's schedule.
    ///
    /// Rules without bounds are always scheduled. Both bounds are inclusive.
    pub fn is_scheduled_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date.is_none_or(|start| now >= start)
            && self.end_date.is_none_or(|end| now <= end)
    }

    /// Compare the rule content, ignoring `is_active` and `created_at`.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.conditions == other.conditions
            && self.logical_operator == other.logical_operator
            && self.target_element_selector == other.target_element_selector
            && self.action == other.action
            && self.respect_ads_enabled == other.respect_ads_enabled
            && self.start_date == other.start_date
            && self.end_date == other.end_date
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Rule {
        Rule::new("r1", "Hide branding on sport", ".bg-branding-main")
            .with_condition(Condition::new(TargetKey::Section, Operator::Equals, "sport"))
            .with_created_at(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
    }

    #[test]
    fn tokens_are_trimmed_and_ordered() {
        let cond = Condition::new(TargetKey::Keywords, Operator::Contains, " Rukomet ,Euro 2026,, ");
        let tokens: Vec<&str> = cond.tokens().collect();
        assert_eq!(tokens, vec!["Rukomet", "Euro 2026"]);
    }

    #[test]
    fn operator_negation_is_involutive() {
        for op in [
            Operator::Equals,
            Operator::NotEquals,
            Operator::Contains,
            Operator::NotContains,
        ] {
            assert_eq!(op.negate().negate(), op);
            assert_ne!(op.negate(), op);
        }
    }

    #[test]
    fn rule_json_shape() {
        let rule = sample();
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["targetElementSelector"], ".bg-branding-main");
        assert_eq!(json["logicalOperator"], "AND");
        assert_eq!(json["action"], "hide");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["conditions"][0]["targetKey"], "section");
        assert_eq!(json["conditions"][0]["operator"], "equals");
        assert!(json.get("startDate").is_none());
    }

    #[test]
    fn legacy_rule_defaults() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "id": "0.123",
            "name": "legacy",
            "conditions": [{"targetKey": "site", "operator": "contains", "value": "gol"}],
            "targetElementSelector": "#promo-box-general"
        }))
        .unwrap();

        assert_eq!(rule.action, ElementAction::Hide);
        assert_eq!(rule.logical_operator, LogicalOperator::And);
        assert!(!rule.is_active);
        assert!(!rule.conditions[0].case_sensitive);
        assert_eq!(rule.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn unknown_operator_deserializes() {
        let cond: Condition = serde_json::from_value(serde_json::json!({
            "targetKey": "section",
            "operator": "regex",
            "value": "x"
        }))
        .unwrap();
        assert_eq!(cond.operator, Operator::Unknown);
    }

    #[test]
    fn content_eq_ignores_toggle_and_creation_time() {
        let a = sample();
        let b = a
            .clone()
            .with_active(false)
            .with_created_at(Utc.timestamp_millis_opt(1).unwrap());
        assert!(a.content_eq(&b));
        assert_ne!(a, b);

        let c = a.clone().with_action(ElementAction::Show);
        assert!(!a.content_eq(&c));
    }

    #[test]
    fn schedule_bounds_are_inclusive() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let end = Utc.timestamp_millis_opt(2_000).unwrap();
        let rule = sample().with_schedule(Some(start), Some(end));

        assert!(!rule.is_scheduled_at(Utc.timestamp_millis_opt(999).unwrap()));
        assert!(rule.is_scheduled_at(start));
        assert!(rule.is_scheduled_at(end));
        assert!(!rule.is_scheduled_at(Utc.timestamp_millis_opt(2_001).unwrap()));
        assert!(sample().is_scheduled_at(Utc::now()));
    }
}
