use serde::{Deserialize, Serialize};

use adex_core::{Condition, FieldValue, Operator, TargetingContext};

/// Outcome of evaluating one condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionResult {
    /// Whether the condition holds.
    pub matched: bool,
    /// Normalized candidate tokens that satisfied the comparison.
    ///
    /// For `Equals`/`Contains` these are the tokens that made the condition
    /// hold. For `NotEquals`/`NotContains` the list is empty when the
    /// condition holds, and names the offending tokens when it does not.
    pub matched_tokens: Vec<String>,
}

impl ConditionResult {
    fn failed() -> Self {
        Self::default()
    }

    fn positive(hits: Vec<String>) -> Self {
        Self {
            matched: !hits.is_empty(),
            matched_tokens: hits,
        }
    }

    fn negative(hits: Vec<String>) -> Self {
        Self {
            matched: hits.is_empty(),
            matched_tokens: hits,
        }
    }
}

/// Normalize a value for comparison: trimmed, and lowercased unless the
/// comparison is case-sensitive.
pub fn normalize(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.trim().to_owned()
    } else {
        value.to_lowercase().trim().to_owned()
    }
}

/// Evaluate a single condition against a targeting context.
///
/// Every operator uses the existential rule: a positive operator holds when
/// any candidate token matches any actual value, and its negation holds when
/// none does. `Contains` degrades to exact membership on list-valued signals
/// so that keyword fragments never match. Unknown keys and operators
/// evaluate to `false`.
pub fn evaluate_condition(condition: &Condition, ctx: &TargetingContext) -> ConditionResult {
    let Some(field) = ctx.field(condition.target_key) else {
        return ConditionResult::failed();
    };

    let cs = condition.case_sensitive;
    let (actual, is_list) = match field {
        FieldValue::Scalar(value) => (vec![normalize(&value, cs)], false),
        FieldValue::List(items) => (items.iter().map(|v| normalize(v, cs)).collect(), true),
    };
    let tokens: Vec<String> = condition.tokens().map(|t| normalize(t, cs)).collect();

    match condition.operator {
        Operator::Equals => ConditionResult::positive(hits(&tokens, &actual, true)),
        Operator::NotEquals => ConditionResult::negative(hits(&tokens, &actual, true)),
        Operator::Contains => ConditionResult::positive(hits(&tokens, &actual, is_list)),
        Operator::NotContains => ConditionResult::negative(hits(&tokens, &actual, is_list)),
        Operator::Unknown => ConditionResult::failed(),
    }
}

/// Tokens, in order, that equal (or are a substring of) at least one value.
fn hits(tokens: &[String], actual: &[String], exact: bool) -> Vec<String> {
    tokens
        .iter()
        .filter(|token| {
            actual.iter().any(|value| {
                if exact {
                    value == *token
                } else {
                    value.contains(token.as_str())
                }
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use adex_core::TargetKey;

    use super::*;

    fn ctx() -> TargetingContext {
        TargetingContext::new()
            .with(TargetKey::Site, "gol")
            .with(TargetKey::Section, "ostali-sportovi")
            .with(TargetKey::TopSection, "sport")
            .with(TargetKey::ContentId, "article:998877")
            .with(TargetKey::DescriptionUrl, "https://gol.dnevnik.hr/sport/euro-2026/clanak")
            .with_keywords(["Rukomet", "Euro 2026"])
            .with_ads_enabled(true)
    }

    fn eval(key: TargetKey, op: Operator, value: &str) -> ConditionResult {
        evaluate_condition(&Condition::new(key, op, value), &ctx())
    }

    #[test]
    fn equals_is_case_insensitive_by_default() {
        let c = TargetingContext::new().with(TargetKey::Section, "SPORT");
        let cond = Condition::new(TargetKey::Section, Operator::Equals, "Sport");
        assert!(evaluate_condition(&cond, &c).matched);

        let cond = cond.with_case_sensitive(true);
        assert!(!evaluate_condition(&cond, &c).matched);
    }

    #[test]
    fn equals_any_token_any_value() {
        let res = eval(TargetKey::TopSection, Operator::Equals, "vijesti, Sport ,show");
        assert!(res.matched);
        assert_eq!(res.matched_tokens, vec!["sport"]);

        let res = eval(TargetKey::Keywords, Operator::Equals, "euro 2026,rukomet");
        assert_eq!(res.matched_tokens, vec!["euro 2026", "rukomet"]);
    }

    #[test]
    fn not_equals_holds_only_when_no_token_matches() {
        let res = eval(TargetKey::TopSection, Operator::NotEquals, "vijesti,show");
        assert!(res.matched);
        assert!(res.matched_tokens.is_empty());

        let res = eval(TargetKey::TopSection, Operator::NotEquals, "vijesti,sport");
        assert!(!res.matched);
        assert_eq!(res.matched_tokens, vec!["sport"]);
    }

    #[test]
    fn contains_is_substring_on_scalars() {
        let res = eval(TargetKey::DescriptionUrl, Operator::Contains, "EURO-2026");
        assert!(res.matched);
        assert_eq!(res.matched_tokens, vec!["euro-2026"]);
        assert!(!eval(TargetKey::DescriptionUrl, Operator::NotContains, "euro-2026").matched);
    }

    #[test]
    fn contains_is_exact_membership_on_keywords() {
        assert!(eval(TargetKey::Keywords, Operator::Contains, "rukomet").matched);
        assert!(!eval(TargetKey::Keywords, Operator::Contains, "ruko").matched);
        assert!(eval(TargetKey::Keywords, Operator::NotContains, "ruko").matched);
    }

    #[test]
    fn missing_fields_are_empty() {
        let empty = TargetingContext::new();
        let eq = Condition::new(TargetKey::AbTest, Operator::Equals, "a_version");
        assert!(!evaluate_condition(&eq, &empty).matched);
        assert!(evaluate_condition(&eq.negated(), &empty).matched);

        let kw = Condition::new(TargetKey::Keywords, Operator::Contains, "x");
        assert!(!evaluate_condition(&kw, &empty).matched);
        assert!(evaluate_condition(&kw.negated(), &empty).matched);
    }

    #[test]
    fn ads_enabled_compares_as_string() {
        assert!(eval(TargetKey::AdsEnabled, Operator::Equals, "true").matched);
        assert!(!eval(TargetKey::AdsEnabled, Operator::Equals, "false").matched);
    }

    #[test]
    fn unknown_key_or_operator_never_matches() {
        assert!(!eval(TargetKey::Unknown, Operator::Equals, "gol").matched);
        assert!(!eval(TargetKey::Unknown, Operator::NotEquals, "gol").matched);
        assert!(!eval(TargetKey::Site, Operator::Unknown, "gol").matched);
    }

    #[test]
    fn negation_is_exact_complement() {
        let values = [
            "gol", "GOL", "go", "sport", "Rukomet", "ruko", "euro 2026", "2026", "", " , ",
            "article:998877", "998877", "true", "x,gol", "dnevnik.hr",
        ];
        let ops = [Operator::Equals, Operator::Contains];
        let contexts = [ctx(), TargetingContext::new()];

        for c in &contexts {
            for key in TargetKey::ALL {
                for op in ops {
                    for value in values {
                        for cs in [false, true] {
                            let cond = Condition::new(key, op, value).with_case_sensitive(cs);
                            let pos = evaluate_condition(&cond, c).matched;
                            let neg = evaluate_condition(&cond.negated(), c).matched;
                            assert_ne!(pos, neg, "{key} {op} {value:?} cs={cs}");
                        }
                    }
                }
            }
        }
    }
}
