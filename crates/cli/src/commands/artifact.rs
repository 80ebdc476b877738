use std::path::PathBuf;

use adex_publisher::render_artifact;
use clap::Args;
use serde_json::json;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ArtifactArgs {
    /// Stored envelope file (`{"rules": [...], "script": "..."}`). When the
    /// file does not exist, nothing is considered stored.
    #[arg(long)]
    pub envelope: PathBuf,
    /// Print the response headers before the body.
    #[arg(long)]
    pub headers: bool,
}

pub fn run(args: &ArtifactArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let envelope = if args.envelope.exists() {
        Some(super::read_envelope(&args.envelope)?)
    } else {
        None
    };
    let artifact = render_artifact(envelope.as_ref());

    match format {
        OutputFormat::Json => {
            let out = json!({
                "live": artifact.is_live(),
                "content_type": artifact.content_type,
                "cache_control": artifact.cache_control,
                "body": artifact.body,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if args.headers {
                for (name, value) in artifact.headers() {
                    println!("{name}: {value}");
                }
                println!();
            }
            print!("{}", artifact.body);
            if !artifact.body.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
