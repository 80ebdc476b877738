use async_trait::async_trait;
use dashmap::DashMap;

use adex_state::error::StateError;
use adex_state::key::StateKey;
use adex_state::store::StateStore;

/// In-memory [`StateStore`] backed by a [`DashMap`].
///
/// This implementation is fully synchronous internally; the async trait
/// methods return immediately. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    data: DashMap<String, String>,
}

impl MemoryStateStore {
    /// Create a new, empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render a [`StateKey`] into the string used as the map key.
    fn render_key(key: &StateKey) -> String {
        key.canonical()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError> {
        Ok(self
            .data
            .get(&Self::render_key(key))
            .map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &StateKey, value: &str) -> Result<(), StateError> {
        self.data.insert(Self::render_key(key), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        Ok(self.data.remove(&Self::render_key(key)).is_some())
    }
}
