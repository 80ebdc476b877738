use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, instrument};

use adex_core::{ElementAction, Rule};

use crate::compiler::payload::CompiledRule;
use crate::compiler::runtime::RUNTIME;
use crate::error::RuleError;

/// The artifact served when no rule is live.
///
/// Cache layers compare against this exact text, so it must never change.
pub const NO_RULES_PLACEHOLDER: &str = "/* AdExclusion: No rules found */";

const HEADER_PREFIX: &str = "/** AdExclusion Live Engine | Generated: ";
const PAYLOAD_PREFIX: &str = "  const rules = ";

/// Output of [`ScriptCompiler::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    /// Script text, or [`NO_RULES_PLACEHOLDER`].
    pub source: String,
    /// Number of rules embedded in the script.
    pub rule_count: usize,
    /// Timestamp written into the header.
    pub generated_at: DateTime<Utc>,
}

impl CompiledScript {
    /// Whether this is the no-op placeholder.
    pub fn is_placeholder(&self) -> bool {
        is_placeholder(&self.source)
    }
}

/// Whether `script` is the canonical "no rules live" marker.
pub fn is_placeholder(script: &str) -> bool {
    script.trim() == NO_RULES_PLACEHOLDER
}

/// Turns a rule list into a standalone page script.
///
/// The script is a fixed interpreter plus the active rules serialized as
/// JSON data. Inactive rules are dropped; when nothing is left the output is
/// [`NO_RULES_PLACEHOLDER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile `rules`, stamping the header with the current time.
    pub fn compile(&self, rules: &[Rule]) -> Result<CompiledScript, RuleError> {
        self.compile_at(rules, Utc::now())
    }

    /// Compile `rules` with an explicit generation timestamp.
    ///
    /// Two calls with the same rules and timestamp return identical text.
    #[instrument(skip_all, fields(rules_count = rules.len()))]
    pub fn compile_at(
        &self,
        rules: &[Rule],
        generated_at: DateTime<Utc>,
    ) -> Result<CompiledScript, RuleError> {
        let payload: Vec<CompiledRule> = rules
            .iter()
            .filter(|r| r.is_active)
            .map(CompiledRule::from)
            .collect();

        if payload.is_empty() {
            debug!("no active rules, emitting placeholder");
            return Ok(CompiledScript {
                source: NO_RULES_PLACEHOLDER.to_owned(),
                rule_count: 0,
                generated_at,
            });
        }

        let data = escape_for_script(&serde_json::to_string(&payload)?);
        let mut source = String::with_capacity(RUNTIME.len() + data.len() + 256);
        let _ = writeln!(
            source,
            "{HEADER_PREFIX}{} | Rules: {} */",
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            payload.len()
        );
        source.push_str("(function () {\n  \"use strict\";\n");
        let _ = writeln!(source, "{PAYLOAD_PREFIX}{data};");
        source.push_str(RUNTIME);
        source.push_str("})();\n");

        debug!(rule_count = payload.len(), bytes = source.len(), "compiled script");
        Ok(CompiledScript {
            source,
            rule_count: payload.len(),
            generated_at,
        })
    }
}

/// Read back the rule payload embedded in a compiled script.
///
/// The placeholder yields an empty list. Scripts that carry no payload line
/// yield [`RuleError::MissingPayload`].
pub fn extract_payload(script: &str) -> Result<Vec<CompiledRule>, RuleError> {
    if is_placeholder(script) {
        return Ok(Vec::new());
    }
    let data = script
        .lines()
        .find_map(|line| line.strip_prefix(PAYLOAD_PREFIX))
        .and_then(|rest| rest.trim_end().strip_suffix(';'))
        .ok_or(RuleError::MissingPayload)?;
    Ok(serde_json::from_str(data)?)
}

/// CSS declarations forced on an element for the given action.
///
/// Hiding also zeroes the box so the page does not keep an empty slot.
pub fn style_declarations(action: ElementAction) -> &'static [(&'static str, &'static str)] {
    match action {
        ElementAction::Hide => &[
            ("display", "none"),
            ("visibility", "hidden"),
            ("pointer-events", "none"),
            ("height", "0"),
            ("margin", "0"),
            ("padding", "0"),
        ],
        ElementAction::Show => &[
            ("display", "block"),
            ("visibility", "visible"),
            ("pointer-events", "auto"),
        ],
    }
}

/// Render the style rule the page script injects for `selector`.
pub fn render_style(selector: &str, action: ElementAction) -> String {
    let decls: Vec<String> = style_declarations(action)
        .iter()
        .map(|(prop, value)| format!("{prop}: {value} !important;"))
        .collect();
    format!("{selector} {{ {} }}", decls.join(" "))
}

/// Make JSON safe to embed in an inline `<script>`.
fn escape_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use adex_core::{Condition, LogicalOperator, Operator, TargetKey};

    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::new("1", "Heineken on handball", ".bg-branding-main")
                .with_condition(Condition::new(TargetKey::Keywords, Operator::Contains, "rukomet")),
            Rule::new("2", "Promo box", "#promo-box-general")
                .with_condition(Condition::new(TargetKey::Section, Operator::NotEquals, "vijesti"))
                .with_logical_operator(LogicalOperator::Or)
                .with_action(ElementAction::Show),
        ]
    }

    #[test]
    fn empty_set_is_placeholder() {
        let script = ScriptCompiler::new().compile(&[]).unwrap();
        assert_eq!(script.source, "/* AdExclusion: No rules found */");
        assert!(script.is_placeholder());
        assert_eq!(script.rule_count, 0);
    }

    #[test]
    fn inactive_rules_are_not_emitted() {
        let mut rules = rules();
        for r in &mut rules {
            r.is_active = false;
        }
        let script = ScriptCompiler::new().compile(&rules).unwrap();
        assert_eq!(script.source, NO_RULES_PLACEHOLDER);

        rules[1].is_active = true;
        let script = ScriptCompiler::new().compile(&rules).unwrap();
        assert_eq!(script.rule_count, 1);
        assert!(!script.source.contains("Heineken"));
        assert!(script.source.contains("Promo box"));
    }

    #[test]
    fn deterministic_modulo_header() {
        let compiler = ScriptCompiler::new();
        let a = compiler.compile_at(&rules(), ts(1_700_000_000_000)).unwrap();
        let b = compiler
            .compile_at(&rules(), ts(1_700_000_000_000) + Duration::minutes(5))
            .unwrap();
        assert_ne!(a.source, b.source);

        let body = |s: &str| s.lines().skip(1).collect::<Vec<_>>().join("\n");
        assert_eq!(body(&a.source), body(&b.source));

        let again = compiler.compile_at(&rules(), a.generated_at).unwrap();
        assert_eq!(a, again);
    }

    #[test]
    fn header_names_time_and_count() {
        let script = ScriptCompiler::new()
            .compile_at(&rules(), ts(1_700_000_000_000))
            .unwrap();
        let header = script.source.lines().next().unwrap();
        assert_eq!(
            header,
            "/** AdExclusion Live Engine | Generated: 2023-11-14T22:13:20.000Z | Rules: 2 */"
        );
    }

    #[test]
    fn payload_is_escaped_for_inline_script() {
        let rule = Rule::new("x", "</script><script>alert(1)</script>\u{2028}", ".x")
            .with_condition(Condition::new(TargetKey::Site, Operator::Equals, "gol"));
        let script = ScriptCompiler::new().compile(&[rule]).unwrap();

        assert!(!script.source.contains("</script>"));
        assert!(!script.source.contains('\u{2028}'));
        assert!(script.source.contains("\\u003c/script>"));

        let payload = extract_payload(&script.source).unwrap();
        assert_eq!(payload[0].name, "</script><script>alert(1)</script>\u{2028}");
    }

    #[test]
    fn payload_reads_back() {
        let script = ScriptCompiler::new().compile(&rules()).unwrap();
        let payload = extract_payload(&script.source).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[1].sel, "#promo-box-general");
        assert_eq!(payload[1].logical_operator, LogicalOperator::Or);

        assert!(extract_payload(NO_RULES_PLACEHOLDER).unwrap().is_empty());
        assert!(matches!(
            extract_payload("console.log(1);"),
            Err(RuleError::MissingPayload)
        ));
    }

    #[test]
    fn reads_empty_payload() {
        let script = "/** old */\n(function(){\n  const rules = [];\n})();";
        assert!(extract_payload(script).unwrap().is_empty());
    }

    #[test]
    fn runtime_uses_descriptor_and_guards() {
        let script = ScriptCompiler::new().compile(&rules()).unwrap();
        assert!(script.source.contains("page_meta.third_party_apps.ntAds.targeting"));
        assert!(script.source.contains("DOMContentLoaded"));
        assert!(script.source.contains("try {"));
        assert!(script.source.contains("textContent"));
        assert!(!script.source.contains("innerHTML"));
        assert!(!script.source.contains("eval("));
    }

    #[test]
    fn style_rules() {
        assert_eq!(
            render_style(".x", ElementAction::Hide),
            ".x { display: none !important; visibility: hidden !important; \
             pointer-events: none !important; height: 0 !important; \
             margin: 0 !important; padding: 0 !important; }"
        );
        assert_eq!(
            render_style("#y", ElementAction::Show),
            "#y { display: block !important; visibility: visible !important; \
             pointer-events: auto !important; }"
        );
    }
}
