use std::path::PathBuf;

use adex_rules::{RuleEngine, RuleTraceResult};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Rules file (a rule list or a stored envelope).
    #[arg(long)]
    pub rules: PathBuf,
    /// Targeting context file (JSON object).
    #[arg(long)]
    pub context: PathBuf,
    /// Evaluation time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Show every rule, not only the ones that fired.
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &EvalArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let rules = super::read_rules(&args.rules)?;
    let ctx = super::read_context(&args.context)?;
    let now = args.at.unwrap_or_else(Utc::now);

    let trace = RuleEngine::new(rules).trace(&ctx, now);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&trace)?);
        }
        OutputFormat::Text => {
            println!(
                "{} of {} rules fired ({} skipped, {}us)",
                trace.matched_rules.len(),
                trace.trace.len(),
                trace.total_rules_skipped,
                trace.evaluation_duration_us
            );
            for entry in &trace.trace {
                if !args.all && entry.result != RuleTraceResult::Matched {
                    continue;
                }
                let reason = entry
                    .skip_reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                println!(
                    "  [{result}] {name} -> {action} {selector}{reason}",
                    result = entry.result.as_str(),
                    name = entry.rule_name,
                    action = entry.action,
                    selector = entry.selector,
                );
                if !entry.matched_tokens.is_empty() {
                    println!("      matched: {}", entry.matched_tokens.join(", "));
                }
                if args.all {
                    for cond in &entry.conditions {
                        let mark = if cond.matched { "+" } else { "-" };
                        println!("      {mark} {}", cond.condition_display);
                    }
                }
            }
        }
    }
    Ok(())
}
