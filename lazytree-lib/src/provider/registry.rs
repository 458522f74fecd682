//! Concurrent registry of delegated providers

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{DelegatedProviders, TreeDataProvider};
use crate::error::ProviderError;
use crate::model::TreeNode;

/// Delegated providers keyed by id, backed by a concurrent hash map.
///
/// Providers can be registered and unregistered from any task while views
/// are fetching; every lookup sees the current registration.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn TreeDataProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    /// Registers a provider, replacing any previous one with the same id.
    pub fn register(&self, id: impl Into<String>, provider: Arc<dyn TreeDataProvider>) {
        let id = id.into();
        log::info!("Registering delegated provider '{}'", id);
        self.providers.insert(id, provider);
    }

    /// Unregisters a provider. Returns `true` if it was registered.
    pub fn unregister(&self, id: &str) -> bool {
        log::info!("Unregistering delegated provider '{}'", id);
        self.providers.remove(id).is_some()
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn lookup(&self, id: &str) -> Option<Arc<dyn TreeDataProvider>> {
        // Clone out of the shard guard; it must not live across an await.
        self.providers.get(id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl DelegatedProviders for ProviderRegistry {
    fn provider_exists(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    async fn get_children(&self, node: &TreeNode, view_id: &str) -> Result<Vec<TreeNode>, ProviderError> {
        let id = node.child_provider_id.as_deref().unwrap_or_default();
        let provider = self
            .lookup(id)
            .ok_or_else(|| ProviderError::Unavailable(id.to_string()))?;
        log::debug!(
            "Delegating children of '{}' to provider '{}' for view '{}'",
            node.handle,
            id,
            view_id
        );
        provider.get_children(Some(node)).await
    }
}
