use serde::{Deserialize, Serialize};

use adex_core::Environment;

use crate::error::PublisherError;

/// Publisher configuration, loaded from a TOML file.
///
/// # Example
///
/// ```toml
/// environment = "dev"
/// artifact_url = "https://cdn.example.com/exclusions/sponsorship_exclusions-dev.js"
///
/// [scheduler]
/// window_seconds = 90
/// interval_seconds = 60
///
/// [audit]
/// max_entries = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Environment this workspace publishes to.
    #[serde(default)]
    pub environment: Environment,
    /// Prefix for every storage key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Public URL of the compiled artifact, purged after a publish or a
    /// schedule transition. No purge is requested when unset.
    #[serde(default)]
    pub artifact_url: Option<String>,
    /// Scheduled sweep configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_namespace() -> String {
    "adex".to_owned()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            namespace: default_namespace(),
            artifact_url: None,
            scheduler: SchedulerConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, PublisherError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| PublisherError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), PublisherError> {
        if self.namespace.trim().is_empty() {
            return Err(PublisherError::Configuration(
                "namespace must not be empty".into(),
            ));
        }
        if self.scheduler.interval_seconds == 0 {
            return Err(PublisherError::Configuration(
                "scheduler.interval_seconds must be at least 1".into(),
            ));
        }
        if self.audit.max_entries == 0 {
            return Err(PublisherError::Configuration(
                "audit.max_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the transition sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the background sweep runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Half-width of the transition window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_window_seconds() -> u64 {
    90
}

fn default_interval_seconds() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_seconds: default_window_seconds(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl SchedulerConfig {
    /// The transition window as a chrono duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.window_seconds).unwrap_or(i64::MAX))
    }

    /// The sweep interval.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_seconds)
    }
}

/// Configuration for the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Entries kept, most recent first.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    adex_audit::DEFAULT_MAX_ENTRIES
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PublisherConfig::from_toml_str("").unwrap();
        assert_eq!(config, PublisherConfig::default());
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.scheduler.window_seconds, 90);
        assert_eq!(config.scheduler.interval_seconds, 60);
        assert_eq!(config.audit.max_entries, 30);
        assert!(config.artifact_url.is_none());
    }

    #[test]
    fn full_document() {
        let toml = r#"
            environment = "dev"
            namespace = "gol"
            artifact_url = "https://cdn.example.com/x-dev.js"

            [scheduler]
            enabled = false
            window_seconds = 120

            [audit]
            max_entries = 10
        "#;
        let config = PublisherConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.namespace, "gol");
        assert_eq!(config.artifact_url.as_deref(), Some("https://cdn.example.com/x-dev.js"));
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.window(), chrono::Duration::seconds(120));
        assert_eq!(config.scheduler.interval_seconds, 60);
        assert_eq!(config.audit.max_entries, 10);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(PublisherConfig::from_toml_str("[audit]\nmax_entries = 0").is_err());
        assert!(PublisherConfig::from_toml_str("[scheduler]\ninterval_seconds = 0").is_err());
        assert!(PublisherConfig::from_toml_str("namespace = \"\"").is_err());
        assert!(PublisherConfig::from_toml_str("environment = \"staging\"").is_err());
    }
}
