use std::sync::Arc;

use leitos_storage::DynStore;
use tracing::info;

use crate::InMemoryStore;

/// Supported store backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory store implemented on top of papaya::HashMap
    #[default]
    InMemoryPapaya,
}

/// Factory configuration to construct a store instance.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

/// Create a store instance based on the provided configuration.
///
/// For now, only the in-memory papaya backend is supported.
pub fn create_store(config: &StoreConfig) -> DynStore {
    match config.backend {
        StoreBackend::InMemoryPapaya => {
            info!(backend = "in-memory", "document store created");
            Arc::new(InMemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leitos_storage::DocumentStore;

    #[test]
    fn test_create_default_store() {
        let store = create_store(&StoreConfig::default());
        assert_eq!(store.backend_name(), "in-memory");
    }
}
