use tracing::warn;

use adex_core::RuleSetEnvelope;
use adex_rules::{NO_RULES_PLACEHOLDER, RuleError, extract_payload, is_placeholder};

/// `Content-Type` of the served artifact.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";

/// `Cache-Control` of the served artifact.
pub const ARTIFACT_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

/// The compiled artifact as served to browsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub body: String,
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

impl Artifact {
    fn new(body: String) -> Self {
        Self {
            body,
            content_type: ARTIFACT_CONTENT_TYPE,
            cache_control: ARTIFACT_CACHE_CONTROL,
        }
    }

    fn placeholder() -> Self {
        Self::new(NO_RULES_PLACEHOLDER.to_owned())
    }

    /// Whether any rule is live in this artifact.
    pub fn is_live(&self) -> bool {
        !is_placeholder(&self.body)
    }

    /// Response headers, in the order they should be written.
    pub fn headers(&self) -> [(&'static str, &'static str); 3] {
        [
            ("Content-Type", self.content_type),
            ("Cache-Control", self.cache_control),
            ("X-Content-Type-Options", "nosniff"),
        ]
    }
}

/// Decide what to serve for a stored envelope.
///
/// The placeholder is served when nothing is stored, when no stored rule is
/// active, when no script was ever published, or when the published script
/// embeds an empty rule list. A stored script without a readable payload is
/// served as-is.
pub fn render_artifact(envelope: Option<&RuleSetEnvelope>) -> Artifact {
    let Some(envelope) = envelope else {
        return Artifact::placeholder();
    };
    if !envelope.has_active_rules() || envelope.script.trim().is_empty() {
        return Artifact::placeholder();
    }

    match extract_payload(&envelope.script) {
        Ok(rules) if rules.is_empty() => Artifact::placeholder(),
        Ok(_) => Artifact::new(envelope.script.clone()),
        Err(RuleError::MissingPayload) => {
            warn!("stored script carries no rule payload, serving it unchanged");
            Artifact::new(envelope.script.clone())
        }
        Err(e) => {
            warn!(error = %e, "stored script payload is unreadable, serving it unchanged");
            Artifact::new(envelope.script.clone())
        }
    }
}
