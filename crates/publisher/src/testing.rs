//! Test doubles shared by unit and integration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::PublisherError;
use crate::purge::CachePurger;

/// A [`CachePurger`] that records every requested URL.
#[derive(Debug, Default)]
pub struct RecordingPurger {
    urls: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingPurger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later purge fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// URLs purged so far, in call order. Failed attempts are included.
    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.urls().len()
    }
}

#[async_trait]
impl CachePurger for RecordingPurger {
    async fn purge(&self, url: &str) -> Result<(), PublisherError> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_owned());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublisherError::Purge(format!("{url}: simulated failure")));
        }
        Ok(())
    }
}
