use std::path::PathBuf;

use adex_rules::ScriptCompiler;
use clap::Args;
use serde_json::json;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Rules file (a rule list or a stored envelope).
    #[arg(long)]
    pub rules: PathBuf,
    /// Write the script here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Reject rule sets that fail validation.
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &CompileArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let rules = super::read_rules(&args.rules)?;
    if args.strict {
        adex_core::validate_rule_set(&rules)?;
    }

    let script = ScriptCompiler::new().compile(&rules)?;

    if let Some(path) = &args.output {
        std::fs::write(path, &script.source)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let out = json!({
                "rule_count": script.rule_count,
                "placeholder": script.is_placeholder(),
                "generated_at": script.generated_at,
                "bytes": script.source.len(),
                "source": if args.output.is_some() { None } else { Some(&script.source) },
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => match &args.output {
            Some(path) => println!(
                "Compiled {} active rule(s) into {} ({} bytes).",
                script.rule_count,
                path.display(),
                script.source.len()
            ),
            None => print!("{}", script.source),
        },
    }
    Ok(())
}
