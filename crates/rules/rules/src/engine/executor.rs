use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use adex_core::{Rule, TargetingContext};

use crate::engine::matcher::{RuleMatch, SkipReason, match_rule};
use crate::engine::trace::{RuleEvaluationTrace, RuleTraceEntry};

/// A rule that fired, with the tokens that made it fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredRule<'a> {
    pub rule: &'a Rule,
    pub trace: Vec<String>,
}

/// Evaluates a rule set against targeting contexts.
///
/// Unlike first-match engines, every rule is independent: each one that
/// fires contributes its own style injection, so evaluation always visits
/// the whole list in order.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Create a new rule engine with the given rules (list order is kept).
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Return a reference to the rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id.
    pub fn rule_by_id(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Return every rule that fires for `ctx`, ignoring schedules.
    #[instrument(skip_all, fields(rules_count = self.rules.len()))]
    pub fn evaluate(&self, ctx: &TargetingContext) -> Vec<FiredRule<'_>> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let outcome = match_rule(rule, ctx);
                fired(rule, outcome)
            })
            .collect()
    }

    /// Return every rule that fires for `ctx` at time `now`.
    ///
    /// Rules whose start/end dates exclude `now` are skipped before matching.
    /// This is the behavior the compiled script reproduces in the page.
    #[instrument(skip_all, fields(rules_count = self.rules.len()))]
    pub fn evaluate_at(&self, ctx: &TargetingContext, now: DateTime<Utc>) -> Vec<FiredRule<'_>> {
        self.rules
            .iter()
            .filter_map(|rule| fired(rule, match_scheduled(rule, ctx, now)))
            .collect()
    }

    /// Evaluate every rule at `now` and record a full trace.
    #[instrument(skip_all, fields(rules_count = self.rules.len()))]
    pub fn trace(&self, ctx: &TargetingContext, now: DateTime<Utc>) -> RuleEvaluationTrace {
        let start = Instant::now();
        let mut entries = Vec::with_capacity(self.rules.len());
        let mut matched_rules = Vec::new();
        let mut evaluated = 0;
        let mut skipped = 0;

        for rule in &self.rules {
            let outcome = match_scheduled(rule, ctx, now);
            if let Some(reason) = outcome.skipped {
                debug!(rule = %rule.name, reason = reason.as_str(), "skipping rule");
                skipped += 1;
            } else {
                evaluated += 1;
            }
            if outcome.fired {
                matched_rules.push(rule.name.clone());
            }
            entries.push(RuleTraceEntry::new(rule, &outcome));
        }

        RuleEvaluationTrace {
            matched_rules,
            total_rules_evaluated: evaluated,
            total_rules_skipped: skipped,
            evaluation_duration_us: u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            trace: entries,
        }
    }
}

fn match_scheduled(rule: &Rule, ctx: &TargetingContext, now: DateTime<Utc>) -> RuleMatch {
    if rule.is_active && !rule.is_scheduled_at(now) {
        return RuleMatch::skipped(SkipReason::NotScheduled);
    }
    match_rule(rule, ctx)
}

fn fired(rule: &Rule, outcome: RuleMatch) -> Option<FiredRule<'_>> {
    if outcome.fired {
        debug!(rule = %rule.name, trace = ?outcome.trace, "rule fired");
        Some(FiredRule {
            rule,
            trace: outcome.trace,
        })
    } else {
        None
    }
}
