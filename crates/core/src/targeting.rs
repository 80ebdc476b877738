use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

/// Name of a targeting signal exposed by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKey {
    Site,
    Keywords,
    Section,
    TopSection,
    PageType,
    ContentId,
    DescriptionUrl,
    Domain,
    AbTest,
    AdsEnabled,
    /// Any key this build does not recognize. Conditions on it never match.
    #[serde(other)]
    Unknown,
}

impl TargetKey {
    /// Every recognized key, in the order the editor presents them.
    pub const ALL: [Self; 10] = [
        Self::Site,
        Self::Keywords,
        Self::Section,
        Self::TopSection,
        Self::PageType,
        Self::ContentId,
        Self::DescriptionUrl,
        Self::Domain,
        Self::AbTest,
        Self::AdsEnabled,
    ];

    /// Return the wire name of the key (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Keywords => "keywords",
            Self::Section => "section",
            Self::TopSection => "top_section",
            Self::PageType => "page_type",
            Self::ContentId => "content_id",
            Self::DescriptionUrl => "description_url",
            Self::Domain => "domain",
            Self::AbTest => "ab_test",
            Self::AdsEnabled => "ads_enabled",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the signal carries a list of values rather than a scalar.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Keywords)
    }
}

impl std::fmt::Display for TargetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw value of one targeting signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// A single string (booleans are rendered as `"true"` / `"false"`).
    Scalar(Cow<'a, str>),
    /// An ordered list of strings.
    List(&'a [String]),
}

/// Page-level targeting signals that rules are evaluated against.
///
/// Deserialization is lenient: missing fields become empty strings, an empty
/// keyword list or `false`; scalar fields accept numbers and booleans;
/// `keywords` accepts a list or a comma-separated string. `ads_enabled` is
/// `true` only for the JSON boolean `true`; a string `"true"` is not enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingContext {
    #[serde(deserialize_with = "lenient_string")]
    pub site: String,
    #[serde(deserialize_with = "lenient_keywords")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub section: String,
    #[serde(deserialize_with = "lenient_string")]
    pub top_section: String,
    #[serde(deserialize_with = "lenient_string")]
    pub page_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub content_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub domain: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ab_test: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub ads_enabled: bool,
}

impl TargetingContext {
    /// Create an empty context (every signal absent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a signal. Returns `None` for [`TargetKey::Unknown`].
    pub fn field(&self, key: TargetKey) -> Option<FieldValue<'_>> {
        match key {
            TargetKey::Keywords => Some(FieldValue::List(&self.keywords)),
            TargetKey::AdsEnabled => Some(FieldValue::Scalar(Cow::Borrowed(if self.ads_enabled {
                "true"
            } else {
                "false"
            }))),
            TargetKey::Site => Some(FieldValue::Scalar(Cow::Borrowed(&self.site))),
            TargetKey::Section => Some(FieldValue::Scalar(Cow::Borrowed(&self.section))),
            TargetKey::TopSection => Some(FieldValue::Scalar(Cow::Borrowed(&self.top_section))),
            TargetKey::PageType => Some(FieldValue::Scalar(Cow::Borrowed(&self.page_type))),
            TargetKey::ContentId => Some(FieldValue::Scalar(Cow::Borrowed(&self.content_id))),
            TargetKey::DescriptionUrl => {
                Some(FieldValue::Scalar(Cow::Borrowed(&self.description_url)))
            }
            TargetKey::Domain => Some(FieldValue::Scalar(Cow::Borrowed(&self.domain))),
            TargetKey::AbTest => Some(FieldValue::Scalar(Cow::Borrowed(&self.ab_test))),
            TargetKey::Unknown => None,
        }
    }

    /// Set a scalar signal from its string form.
    ///
    /// `keywords` is split on commas. `ads_enabled` has no string form and is
    /// left unchanged; use [`with_ads_enabled`](Self::with_ads_enabled).
    /// Unknown keys are ignored.
    #[must_use]
    pub fn with(mut self, key: TargetKey, value: impl Into<String>) -> Self {
        let value = value.into();
        match key {
            TargetKey::Site => self.site = value,
            TargetKey::Keywords => self.keywords = split_keywords(&value),
            TargetKey::Section => self.section = value,
            TargetKey::TopSection => self.top_section = value,
            TargetKey::PageType => self.page_type = value,
            TargetKey::ContentId => self.content_id = value,
            TargetKey::DescriptionUrl => self.description_url = value,
            TargetKey::Domain => self.domain = value,
            TargetKey::AbTest => self.ab_test = value,
            TargetKey::AdsEnabled | TargetKey::Unknown => {}
        }
        self
    }

    /// Replace the keyword list.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the `ads_enabled` flag.
    #[must_use]
    pub fn with_ads_enabled(mut self, enabled: bool) -> Self {
        self.ads_enabled = enabled;
        self
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(scalar_to_string).unwrap_or_default())
}

fn lenient_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items.iter().map(scalar_to_string).collect(),
        Some(serde_json::Value::String(s)) => split_keywords(&s),
        Some(serde_json::Value::Null) | None => Vec::new(),
        Some(other) => vec![scalar_to_string(&other)],
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(serde_json::Value::Bool(true))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let ctx: TargetingContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, TargetingContext::default());
        assert!(!ctx.ads_enabled);
        assert!(ctx.keywords.is_empty());
    }

    #[test]
    fn lenient_field_shapes() {
        let ctx: TargetingContext = serde_json::from_value(serde_json::json!({
            "site": "gol",
            "keywords": "Rukomet, Euro 2026",
            "content_id": 958_381,
            "section": null,
            "ads_enabled": true
        }))
        .unwrap();

        assert_eq!(ctx.site, "gol");
        assert_eq!(ctx.keywords, vec!["Rukomet", "Euro 2026"]);
        assert_eq!(ctx.content_id, "958381");
        assert_eq!(ctx.section, "");
        assert!(ctx.ads_enabled);
    }

    #[test]
    fn ads_enabled_rejects_other_values() {
        let ctx: TargetingContext =
            serde_json::from_value(serde_json::json!({"ads_enabled": 1})).unwrap();
        assert!(!ctx.ads_enabled);
        let ctx: TargetingContext =
            serde_json::from_value(serde_json::json!({"ads_enabled": "yes"})).unwrap();
        assert!(!ctx.ads_enabled);
        let ctx: TargetingContext =
            serde_json::from_value(serde_json::json!({"ads_enabled": "true"})).unwrap();
        assert!(!ctx.ads_enabled);
        assert!(!TargetingContext::new().with(TargetKey::AdsEnabled, "true").ads_enabled);
    }

    #[test]
    fn field_lookup() {
        let ctx = TargetingContext::new()
            .with(TargetKey::Section, "sport")
            .with_keywords(["a", "b"])
            .with_ads_enabled(true);

        assert_eq!(
            ctx.field(TargetKey::Section),
            Some(FieldValue::Scalar(Cow::Borrowed("sport")))
        );
        assert_eq!(
            ctx.field(TargetKey::AdsEnabled),
            Some(FieldValue::Scalar(Cow::Borrowed("true")))
        );
        assert!(matches!(
            ctx.field(TargetKey::Keywords),
            Some(FieldValue::List(list)) if list.len() == 2
        ));
        assert_eq!(ctx.field(TargetKey::Unknown), None);
    }

    #[test]
    fn unknown_key_deserializes() {
        let key: TargetKey = serde_json::from_str("\"author\"").unwrap();
        assert_eq!(key, TargetKey::Unknown);
        let key: TargetKey = serde_json::from_str("\"top_section\"").unwrap();
        assert_eq!(key, TargetKey::TopSection);
        assert_eq!(key.to_string(), "top_section");
    }
}
