use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audit::AuditAction;
use crate::error::AdexError;

/// Deployment environment a workspace publishes to.
///
/// Always supplied explicitly by configuration; never inferred from the
/// host the editor happens to run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl Environment {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Storage key holding this environment's rule-set envelope.
    #[must_use]
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Dev => "rules_data_dev",
            Self::Prod => "rules_data",
        }
    }

    /// Audit action recorded when this environment is published.
    #[must_use]
    pub fn publish_action(&self) -> AuditAction {
        match self {
            Self::Dev => AuditAction::PublishDev,
            Self::Prod => AuditAction::PublishProd,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = AdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(AdexError::UnknownEnvironment(other.to_owned())),
        }
    }
}
