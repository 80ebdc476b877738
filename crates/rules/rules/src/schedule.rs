use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use adex_core::Rule;

/// Default half-width of the transition window, in seconds.
pub const DEFAULT_TRANSITION_WINDOW_SECS: i64 = 90;

/// Which schedule bound a rule is crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// A rule whose start or end date lies near the evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<'a> {
    pub rule: &'a Rule,
    pub boundary: Boundary,
    /// The boundary timestamp.
    pub at: DateTime<Utc>,
}

/// Finds active rules crossing a schedule boundary around "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDetector {
    window: Duration,
}

impl Default for TransitionDetector {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TRANSITION_WINDOW_SECS))
    }
}

impl TransitionDetector {
    /// Create a detector with the given window. Negative windows are
    /// treated as their absolute value.
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.abs(),
        }
    }

    /// The window half-width.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Active rules with a start or end date within the window of `now`.
    pub fn find_transitioning<'a>(&self, rules: &'a [Rule], now: DateTime<Utc>) -> Vec<&'a Rule> {
        find_transitioning(rules, now, self.window)
    }

    /// Every boundary crossing within the window of `now`, one entry per
    /// bound. A rule whose start and end both fall in the window appears
    /// twice.
    #[instrument(skip_all, fields(rules_count = rules.len()))]
    pub fn find_transitions<'a>(
        &self,
        rules: &'a [Rule],
        now: DateTime<Utc>,
    ) -> Vec<Transition<'a>> {
        let transitions: Vec<Transition<'a>> = rules
            .iter()
            .filter(|r| r.is_active)
            .flat_map(|rule| {
                [
                    (Boundary::Start, rule.start_date),
                    (Boundary::End, rule.end_date),
                ]
                .into_iter()
                .filter_map(move |(boundary, at)| {
                    at.filter(|at| within(*at, now, self.window))
                        .map(|at| Transition { rule, boundary, at })
                })
            })
            .collect();
        debug!(count = transitions.len(), "transition scan complete");
        transitions
    }
}

/// Active rules whose `start_date` or `end_date` satisfies
/// `|now - date| <= window`.
pub fn find_transitioning(rules: &[Rule], now: DateTime<Utc>, window: Duration) -> Vec<&Rule> {
    let window = window.abs();
    rules
        .iter()
        .filter(|r| r.is_active)
        .filter(|r| {
            r.start_date.is_some_and(|d| within(d, now, window))
                || r.end_date.is_some_and(|d| within(d, now, window))
        })
        .collect()
}

fn within(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    (now - at).abs() <= window
}
