//! Data provider contracts
//!
//! A view has one default [`TreeDataProvider`] that can be swapped at any
//! time, plus a set of [`DelegatedProviders`] that individual nodes can
//! hand their children off to via [`TreeNode::child_provider_id`].

mod registry;

pub use registry::*;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::TreeNode;

/// Supplies top-level nodes and the children of materialized nodes.
///
/// # Example
///
/// ```ignore
/// use lazytree_lib::provider::TreeDataProvider;
///
/// struct Servers;
///
/// #[async_trait]
/// impl TreeDataProvider for Servers {
///     async fn get_children(&self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>, ProviderError> {
///         match node {
///             None => Ok(vec![TreeNode::new("srv", "Server").collapsible(CollapsibleState::Collapsed)]),
///             Some(_) => Ok(Vec::new()),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait TreeDataProvider: Send + Sync {
    /// Returns the children of `node`, or the top-level nodes when `node`
    /// is `None`.
    async fn get_children(&self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>, ProviderError>;
}

/// Lookup of delegated providers by id.
///
/// Registration can change at any time; callers must not cache the answer
/// of [`provider_exists`](Self::provider_exists).
#[async_trait]
pub trait DelegatedProviders: Send + Sync {
    /// Returns `true` if a provider is currently registered under `id`.
    fn provider_exists(&self, id: &str) -> bool;

    /// Fetches the children of `node` from the provider named by its
    /// `child_provider_id`.
    async fn get_children(&self, node: &TreeNode, view_id: &str) -> Result<Vec<TreeNode>, ProviderError>;
}
