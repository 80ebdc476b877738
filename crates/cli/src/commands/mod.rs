pub mod artifact;
pub mod compile;
pub mod diff;
pub mod eval;
pub mod sweep;

use std::path::Path;

use adex_core::{Rule, RuleSetEnvelope};
use serde::de::DeserializeOwned;

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Read a stored envelope. A bare rule list is accepted as an envelope
/// without a script.
pub fn read_envelope(path: &Path) -> anyhow::Result<RuleSetEnvelope> {
    let value: serde_json::Value = read_json(path)?;
    if value.is_array() {
        Ok(RuleSetEnvelope::new(serde_json::from_value(value)?))
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

/// Read a rule list from either a bare list or an envelope.
pub fn read_rules(path: &Path) -> anyhow::Result<Vec<Rule>> {
    Ok(read_envelope(path)?.rules)
}

pub fn read_context(path: &Path) -> anyhow::Result<adex_core::TargetingContext> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("adex-cli-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_bare_rule_list() {
        let path = write_temp(
            "list.json",
            r#"[{"id":"1","name":"A","conditions":[{"targetKey":"site","operator":"equals","value":"gol"}],"targetElementSelector":".x"}]"#,
        );
        let envelope = read_envelope(&path).unwrap();
        assert_eq!(envelope.rules.len(), 1);
        assert!(envelope.script.is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn reads_envelope() {
        let path = write_temp("envelope.json", r#"{"rules":[],"script":"x"}"#);
        let envelope = read_envelope(&path).unwrap();
        assert!(envelope.rules.is_empty());
        assert_eq!(envelope.script, "x");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_rules(Path::new("/nonexistent/adex-rules.json")).is_err());
    }
}
