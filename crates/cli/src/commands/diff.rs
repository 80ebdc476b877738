use std::path::PathBuf;

use adex_audit::ChangeClassifier;
use adex_publisher::PublisherConfig;
use clap::Args;
use serde_json::json;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Previous rules file.
    #[arg(long)]
    pub old: PathBuf,
    /// New rules file.
    #[arg(long)]
    pub new: PathBuf,
    /// Describe a publish of the new rules instead of an edit.
    #[arg(long)]
    pub publish: bool,
}

pub fn run(args: &DiffArgs, config: &PublisherConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let old = super::read_rules(&args.old)?;
    let new = super::read_rules(&args.new)?;
    let classifier = ChangeClassifier::new();

    let classification = if args.publish {
        let active = new.iter().filter(|r| r.is_active).count();
        classifier.classify_publish(config.environment, active)
    } else {
        classifier.classify(&old, &new)
    };

    match format {
        OutputFormat::Json => {
            let out = json!({
                "action": classification.action,
                "details": classification.details,
                "rule_id": classification.rule_id,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{}: {}", classification.action, classification.details);
        }
    }
    Ok(())
}
