use async_trait::async_trait;

use crate::error::StateError;
use crate::key::StateKey;

/// Key-value storage for rule-set envelopes, audit logs and snapshots.
///
/// Values are opaque JSON strings. Implementations must be `Send + Sync` and
/// safe for concurrent access; a write must be fully visible to the next
/// read of the same key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the value for a key. Returns `None` if not found.
    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError>;

    /// Set a value, overwriting any previous value.
    async fn set(&self, key: &StateKey, value: &str) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &StateKey) -> Result<bool, StateError>;
}
