//! Data source adapter
//!
//! Presents the default provider and the delegated providers as a single
//! set of primitives (`has_children`, `get_children`, `get_parent`). Node
//! level failures stop here: they are logged and reported as
//! [`FetchOutcome::Failed`] so the view can collapse the node and let the
//! next expand retry.

use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{NodeKey, TreeNode};
use crate::provider::{DelegatedProviders, TreeDataProvider};

/// Result of fetching one node's children.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The provider answered.
    Children(Vec<TreeNode>),
    /// The provider failed; the error has already been logged.
    Failed,
}

/// Dispatches child requests to the default or a delegated provider.
pub struct DataSource {
    view_id: String,
    provider: RwLock<Option<Arc<dyn TreeDataProvider>>>,
    delegated: Arc<dyn DelegatedProviders>,
}

impl DataSource {
    /// Creates a data source with no default provider.
    pub fn new(view_id: impl Into<String>, delegated: Arc<dyn DelegatedProviders>) -> Self {
        Self {
            view_id: view_id.into(),
            provider: RwLock::new(None),
            delegated,
        }
    }

    /// Replaces the default provider.
    pub fn set_provider(&self, provider: Option<Arc<dyn TreeDataProvider>>) {
        let mut guard = self.provider.write().unwrap_or_else(PoisonError::into_inner);
        *guard = provider;
    }

    /// Returns `true` if a default provider is set.
    pub fn has_provider(&self) -> bool {
        self.provider().is_some()
    }

    fn provider(&self) -> Option<Arc<dyn TreeDataProvider>> {
        self.provider
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Returns `true` if `node` should show an expand affordance.
    ///
    /// A node delegating to a provider that has since been unregistered is
    /// no longer expandable.
    pub fn has_children(&self, node: &TreeNode) -> bool {
        if !node.collapsible_state.is_container() {
            return false;
        }
        match node.child_provider_id.as_deref() {
            Some(id) => self.delegated.provider_exists(id),
            None => self.has_provider(),
        }
    }

    /// Fetches the children of the node addressed by `key`.
    ///
    /// The root asks the default provider for its top-level nodes. Without
    /// a default provider there is nothing to show and the answer is empty.
    pub async fn get_children(&self, key: &NodeKey, node: &TreeNode) -> FetchOutcome {
        if let Some(id) = node.child_provider_id.as_deref()
            && !key.is_root()
        {
            return match self.delegated.get_children(node, &self.view_id).await {
                Ok(children) => FetchOutcome::Children(children),
                Err(err) => {
                    log::warn!(
                        "Delegated provider '{}' failed for '{}': {} (retryable: {})",
                        id,
                        node.handle,
                        err,
                        err.is_retryable()
                    );
                    FetchOutcome::Failed
                }
            };
        }

        let Some(provider) = self.provider() else {
            log::debug!("No data provider for view '{}'", self.view_id);
            return FetchOutcome::Children(Vec::new());
        };
        let request = if key.is_root() { None } else { Some(node) };
        match provider.get_children(request).await {
            Ok(children) => FetchOutcome::Children(children),
            Err(err) => {
                log::warn!("Data provider failed for '{}': {} (retryable: {})", key, err, err.is_retryable());
                FetchOutcome::Failed
            }
        }
    }

    /// Always `None`: providers do not expose upward navigation.
    pub fn get_parent(&self, _node: &TreeNode) -> Option<TreeNode> {
        None
    }
}
