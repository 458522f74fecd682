//! Demo data providers
//!
//! [`CatalogProvider`] serves a small, static server catalog parsed from
//! JSON. [`RemoteProvider`] stands in for a delegated provider behind a
//! slow link: it answers after a delay and times out on its first request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lazytree_lib::TreeNode;
use lazytree_lib::error::ProviderError;
use lazytree_lib::provider::TreeDataProvider;

/// Id the remote provider is registered under.
pub const REMOTE_PROVIDER_ID: &str = "remote-objects";

const CATALOG: &str = r#"{
    "": [
        { "handle": "local", "label": "localhost", "collapsibleState": "Collapsed",
          "contextValue": "server", "providerHandle": "MSSQL" },
        { "handle": "remote", "label": "remote.example", "collapsibleState": "Collapsed",
          "contextValue": "server", "childProviderId": "remote-objects" },
        { "handle": "notes", "label": "notes.sql",
          "command": { "id": "editor.open", "title": "Open", "arguments": ["notes.sql"] } }
    ],
    "local": [
        { "handle": "local/master", "label": "master", "collapsibleState": "Collapsed",
          "contextValue": "database", "providerHandle": "MSSQL" },
        { "handle": "local/sales", "label": "sales", "collapsibleState": "Collapsed",
          "contextValue": "database", "providerHandle": "MSSQL" }
    ],
    "local/sales": [
        { "handle": "local/sales/orders", "label": "dbo.orders", "contextValue": "table",
          "providerHandle": "MSSQL",
          "command": { "id": "table.select", "title": "Select Top 1000",
                       "arguments": ["local/sales/orders"] } }
    ]
}"#;

/// Static catalog keyed by parent handle (`""` for the top level).
pub struct CatalogProvider {
    children: HashMap<String, Vec<TreeNode>>,
}

impl CatalogProvider {
    /// Parses the built-in catalog.
    pub fn new() -> Result<Self, serde_json::Error> {
        Ok(Self {
            children: serde_json::from_str(CATALOG)?,
        })
    }
}

#[async_trait]
impl TreeDataProvider for CatalogProvider {
    async fn get_children(&self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>, ProviderError> {
        let parent = node.map(|n| n.handle.as_str()).unwrap_or_default();
        Ok(self.children.get(parent).cloned().unwrap_or_default())
    }
}

/// Slow delegated provider that fails its first request.
pub struct RemoteProvider {
    latency: Duration,
    requests: AtomicUsize,
}

impl RemoteProvider {
    /// Creates a provider answering after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TreeDataProvider for RemoteProvider {
    async fn get_children(&self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>, ProviderError> {
        let attempt = self.requests.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        if attempt == 0 {
            return Err(ProviderError::Timeout(self.latency));
        }

        let Some(parent) = node else {
            return Ok(Vec::new());
        };
        Ok((1..=3)
            .map(|i| {
                TreeNode::new(format!("{}/db{}", parent.handle, i), format!("remote_db_{}", i))
                    .with_context_value("database")
                    .with_description("remote")
            })
            .collect())
    }
}
