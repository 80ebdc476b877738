use serde::{Deserialize, Serialize};

use adex_core::{Condition, ElementAction, LogicalOperator, Rule};

/// The data-only form of a rule embedded in a compiled artifact.
///
/// Field names are kept short because every published page downloads them.
/// Field order is fixed so that compiling the same rules twice yields the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub name: String,
    pub conds: Vec<Condition>,
    #[serde(rename = "lOp")]
    pub logical_operator: LogicalOperator,
    pub sel: String,
    pub act: ElementAction,
    /// Respect `ads_enabled`.
    pub rae: bool,
    /// Schedule start, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    /// Schedule end, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl From<&Rule> for CompiledRule {
    fn from(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            conds: rule.conditions.clone(),
            logical_operator: rule.logical_operator,
            sel: rule.target_element_selector.clone(),
            act: rule.action,
            rae: rule.respect_ads_enabled,
            start: rule.start_date.map(|d| d.timestamp_millis()),
            end: rule.end_date.map(|d| d.timestamp_millis()),
        }
    }
}
