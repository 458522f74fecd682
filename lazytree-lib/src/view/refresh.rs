//! On-demand fetching, invalidation and batched refresh

use std::collections::HashSet;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};

use super::{TreeView, TreeViewEvent};
use crate::cache::{Committed, FetchFuture, Lookup, Ticket};
use crate::model::{CollapsibleState, Handle, NodeKey, TreeNode};
use crate::source::FetchOutcome;

impl TreeView {
    /// Returns the children of a node, fetching them if needed.
    ///
    /// Cached children are returned without touching the provider. While a
    /// fetch for the node is outstanding, further callers await that same
    /// fetch. Leaves and unknown nodes have no children. A failed fetch
    /// yields no children and leaves the node collapsed and retryable.
    pub async fn get_children(&self, key: &NodeKey) -> Vec<TreeNode> {
        let fetch = {
            let mut cache = self.cache();
            match cache.lookup(key) {
                Lookup::Missing => {
                    log::debug!("Children requested for unknown node '{}'", key);
                    return Vec::new();
                }
                Lookup::Leaf => return Vec::new(),
                Lookup::Cached(children) => {
                    log::debug!("Cache hit for '{}'", key);
                    return children;
                }
                Lookup::InFlight(fetch) => {
                    log::debug!("Joining in-flight fetch for '{}'", key);
                    fetch
                }
                Lookup::NeedsFetch(node) => {
                    let Some(ticket) = cache.reserve(key) else {
                        return Vec::new();
                    };
                    let fetch = self.start_fetch(key.clone(), node, ticket);
                    cache.begin_fetch(key, ticket, fetch.clone());
                    fetch
                }
            }
        };
        fetch.await
    }

    fn start_fetch(&self, key: NodeKey, node: TreeNode, ticket: Ticket) -> FetchFuture {
        log::debug!("Fetching children of '{}'", key);
        let source = Arc::clone(&self.inner.source);
        let weak = self.downgrade();
        async move {
            let outcome = source.get_children(&key, &node).await;
            match Self::from_weak(&weak) {
                Some(view) => view.complete_fetch(&key, ticket, outcome),
                None => Vec::new(),
            }
        }
        .boxed()
        .shared()
    }

    fn complete_fetch(&self, key: &NodeKey, ticket: Ticket, outcome: FetchOutcome) -> Vec<TreeNode> {
        match outcome {
            FetchOutcome::Children(children) => {
                let committed = self.cache().commit(key, ticket, children.clone());
                match committed {
                    Some(Committed { children, evicted }) => {
                        log::debug!(
                            "Cached {} children for '{}', evicted {}",
                            children.len(),
                            key,
                            evicted.len()
                        );
                        children
                    }
                    None => {
                        log::warn!("Discarding stale children for '{}'", key);
                        children
                    }
                }
            }
            FetchOutcome::Failed => {
                if self.cache().fail(key, ticket) {
                    self.collapse_for_retry(key);
                }
                Vec::new()
            }
        }
    }

    /// Collapses a node whose fetch failed and re-renders it, so the next
    /// expand fetches again.
    fn collapse_for_retry(&self, key: &NodeKey) {
        let was_expanded = match key.handle() {
            Some(handle) => self.shell().expanded.remove(handle),
            None => false,
        };
        if let Some(widget) = self.widget() {
            if !key.is_root() {
                widget.collapse(key);
            }
            widget.refresh(key);
        }
        if was_expanded && let Some(node) = self.node(key) {
            self.emit(TreeViewEvent::DidCollapseItem(node));
        }
    }

    /// Drops shell state that refers to nodes no longer in the cache.
    ///
    /// Runs once a batch settled: a handle evicted by one commit may come
    /// back with the next, and keeps its expansion when it does.
    fn prune_detached(&self) {
        let cache = self.cache();
        let mut shell = self.shell();
        shell.expanded.retain(|handle| cache.contains(&NodeKey::item(handle.as_str())));
        if let Some(context) = &shell.node_context
            && !cache.contains(&context.node.key())
        {
            shell.node_context = None;
        }
    }

    /// Returns `true` if the node should show an expand affordance.
    pub fn has_children(&self, key: &NodeKey) -> bool {
        match self.node(key) {
            Some(_) if key.is_root() => true,
            Some(node) => self.inner.source.has_children(&node),
            None => false,
        }
    }

    /// Always `None`: providers do not support upward navigation.
    pub fn get_parent(&self, key: &NodeKey) -> Option<TreeNode> {
        let node = self.node(key)?;
        self.inner.source.get_parent(&node)
    }

    /// The widget-facing id of a node: its handle.
    pub fn get_id(&self, node: &TreeNode) -> Handle {
        node.handle.clone()
    }

    /// Returns `true` if the widget should expand the node on first render.
    pub fn should_autoexpand(&self, node: &TreeNode) -> bool {
        node.collapsible_state == CollapsibleState::Expanded
    }

    /// Clears the cached children of `nodes` (the root when `None`) and
    /// re-renders them.
    ///
    /// Only the listed nodes are invalidated. While the view is hidden the
    /// nodes are queued instead and refreshed when it is shown again. Does
    /// nothing without a data provider.
    pub async fn refresh(&self, nodes: Option<Vec<NodeKey>>) {
        if !self.has_data_provider() {
            log::debug!("Ignoring refresh of view '{}' without data provider", self.id());
            return;
        }
        let nodes = nodes.unwrap_or_else(|| vec![NodeKey::Root]);
        {
            let mut cache = self.cache();
            for node in &nodes {
                cache.invalidate(node);
            }
        }

        let run_now = {
            let mut shell = self.shell();
            if shell.visible && shell.activated {
                true
            } else {
                log::debug!("View '{}' hidden, queueing {} refreshes", self.inner.id, nodes.len());
                shell.pending_refresh.extend(nodes.iter().cloned());
                false
            }
        };
        if run_now {
            self.do_refresh(nodes).await;
        }
    }

    /// Re-renders `nodes` through the cache, fetching what was invalidated.
    ///
    /// All nodes are reloaded concurrently; the widget is refreshed once
    /// every reload finished. Focus is restored if the view had it.
    pub(crate) async fn do_refresh(&self, nodes: Vec<NodeKey>) {
        let Some(widget) = self.widget() else { return };
        let nodes = dedup_keys(nodes);

        self.shell().refreshing += 1;
        join_all(nodes.iter().map(|node| self.reload(node.clone()))).await;
        self.prune_detached();
        for node in &nodes {
            widget.refresh(node);
        }
        let focused = {
            let mut shell = self.shell();
            shell.refreshing = shell.refreshing.saturating_sub(1);
            shell.focused
        };

        self.update_content_areas();
        if focused {
            self.focus().await;
        }
    }

    /// Loads the children of a visible container and, recursively, of its
    /// expanded descendants.
    fn reload(&self, key: NodeKey) -> BoxFuture<'_, ()> {
        async move {
            if !key.is_root() && !self.is_expanded(&key) {
                return;
            }
            let children = self.get_children(&key).await;
            let expanded: Vec<NodeKey> = {
                let shell = self.shell();
                children
                    .iter()
                    .filter(|child| shell.expanded.contains(&child.handle))
                    .map(TreeNode::key)
                    .collect()
            };
            join_all(expanded.into_iter().map(|child| self.reload(child))).await;
        }
        .boxed()
    }

    /// Returns `true` if the node is expanded. The root always is.
    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        match key.handle() {
            None => true,
            Some(handle) => self.shell().expanded.contains(handle),
        }
    }
}

/// Removes repeated keys, keeping the first occurrence.
pub(crate) fn dedup_keys(keys: Vec<NodeKey>) -> Vec<NodeKey> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}
