use async_trait::async_trait;
use tracing::info;

use crate::error::PublisherError;

/// Invalidates a cached copy of the compiled artifact.
///
/// The transport (CDN API, reverse proxy, ...) lives behind this trait so
/// the workspace never performs network calls itself.
#[async_trait]
pub trait CachePurger: Send + Sync {
    /// Request that `url` be dropped from every cache in front of it.
    async fn purge(&self, url: &str) -> Result<(), PublisherError>;
}

/// A purger that only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPurger;

#[async_trait]
impl CachePurger for LogPurger {
    async fn purge(&self, url: &str) -> Result<(), PublisherError> {
        info!(url, "cache purge requested");
        Ok(())
    }
}
