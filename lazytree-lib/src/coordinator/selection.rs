//! Selection, expansion and focus

use std::sync::Arc;

use crate::model::{NodeKey, TreeNode};
use crate::view::{OpenMode, TreeView, TreeViewEvent};
use crate::widget::{InputOrigin, SelectionChange, SelectionSource, TreeWidget};

/// The node that holds the keyboard focus cursor, with its view.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContext {
    /// The focused node.
    pub node: TreeNode,
    /// Id of the view the node belongs to.
    pub view_id: String,
}

/// Returns `true` if a selection made with `origin` opens the node's
/// command under `mode`.
pub fn opens_command(origin: InputOrigin, mode: OpenMode) -> bool {
    match origin {
        InputOrigin::Keyboard | InputOrigin::Programmatic => true,
        InputOrigin::Mouse { click_count } => mode == OpenMode::SingleClick || click_count >= 2,
    }
}

impl TreeView {
    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Selects `nodes`.
    ///
    /// Selections made here never run node commands. Before the widget
    /// exists the selection is kept and applied on first activation.
    pub fn set_selection(&self, nodes: &[NodeKey]) {
        match self.widget() {
            Some(widget) => self.apply_selection(&widget, nodes),
            None => self.shell().pending_selection = Some(nodes.to_vec()),
        }
    }

    pub(crate) fn apply_selection(&self, widget: &Arc<dyn TreeWidget>, nodes: &[NodeKey]) {
        let known: Vec<NodeKey> = {
            let cache = self.cache();
            nodes.iter().filter(|key| cache.contains(key)).cloned().collect()
        };
        if known.len() != nodes.len() {
            log::debug!("Dropping {} unknown nodes from selection", nodes.len() - known.len());
        }
        widget.set_selection(&known, SelectionSource::Api);
    }

    /// The selected nodes.
    pub fn selection(&self) -> Vec<TreeNode> {
        let keys = match self.widget() {
            Some(widget) => widget.selection(),
            None => self.shell().pending_selection.clone().unwrap_or_default(),
        };
        self.resolve(&keys)
    }

    fn resolve(&self, keys: &[NodeKey]) -> Vec<TreeNode> {
        let cache = self.cache();
        keys.iter().filter_map(|key| cache.node(key).cloned()).collect()
    }

    /// Handles a selection change reported by the widget.
    ///
    /// Only genuine row selections are surfaced: changes caused by a
    /// twistie click or echoed from [`set_selection`](Self::set_selection)
    /// are dropped. If the first selected node carries a command it is run
    /// when the input opens it under the configured [`OpenMode`].
    pub async fn on_selection_changed(&self, change: SelectionChange) {
        if change.twistie_click || change.source == SelectionSource::Api {
            return;
        }
        let nodes = self.resolve(&change.selection);
        self.emit(TreeViewEvent::DidChangeSelection(nodes.clone()));

        let Some(command) = nodes.first().and_then(|node| node.command.clone()) else {
            return;
        };
        if !opens_command(change.origin, self.inner.config.open_mode) {
            return;
        }
        log::debug!("Running command '{}' of selected node", command.id);
        if let Err(err) = self
            .inner
            .commands
            .execute_command(&command.id, command.arguments)
            .await
        {
            log::warn!("Command '{}' failed: {}", command.id, err);
        }
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    /// Expands `nodes`, loading their children.
    ///
    /// Leaves and unknown nodes are skipped. A node whose fetch fails ends
    /// up collapsed again.
    pub async fn expand(&self, nodes: &[NodeKey]) {
        let widget = self.widget();
        let mut loads = Vec::new();
        for key in nodes {
            if !self.mark_expanded(key) {
                continue;
            }
            if let Some(widget) = &widget {
                widget.expand(key);
            }
            loads.push(key.clone());
        }
        futures::future::join_all(loads.iter().map(|key| self.get_children(key))).await;
    }

    /// Collapses `nodes`. Cached children are kept.
    pub fn collapse(&self, nodes: &[NodeKey]) {
        let widget = self.widget();
        for key in nodes {
            if !self.mark_collapsed(key) {
                continue;
            }
            if let Some(widget) = &widget {
                widget.collapse(key);
            }
        }
    }

    /// Collapses every expanded node.
    pub fn collapse_all(&self) {
        let expanded: Vec<NodeKey> = self.shell().expanded.iter().cloned().map(NodeKey::Item).collect();
        log::debug!("Collapsing {} nodes of view '{}'", expanded.len(), self.id());
        self.collapse(&expanded);
    }

    /// The widget expanded `node` (twistie click or keyboard).
    pub async fn on_expanded(&self, node: &NodeKey) {
        if self.mark_expanded(node) {
            self.get_children(node).await;
        }
    }

    /// The widget collapsed `node`.
    pub fn on_collapsed(&self, node: &NodeKey) {
        self.mark_collapsed(node);
    }

    /// Records `key` as expanded and announces it. Returns `false` if the
    /// node cannot be expanded or already was.
    fn mark_expanded(&self, key: &NodeKey) -> bool {
        let Some(handle) = key.handle() else { return false };
        if !self.has_children(key) {
            return false;
        }
        if !self.shell().expanded.insert(handle.to_string()) {
            return false;
        }
        if let Some(node) = self.node(key) {
            self.emit(TreeViewEvent::DidExpandItem(node));
        }
        true
    }

    fn mark_collapsed(&self, key: &NodeKey) -> bool {
        let Some(handle) = key.handle() else { return false };
        if !self.shell().expanded.remove(handle) {
            return false;
        }
        if let Some(node) = self.node(key) {
            self.emit(TreeViewEvent::DidCollapseItem(node));
        }
        true
    }

    // -------------------------------------------------------------------------
    // Focus and reveal
    // -------------------------------------------------------------------------

    /// Focuses the view, then moves the widget's focus cursor to `node`.
    pub async fn set_focus(&self, node: &NodeKey) {
        if !self.cache().contains(node) {
            return;
        }
        self.focus().await;
        self.move_cursor(node);
    }

    pub(crate) fn move_cursor(&self, node: &NodeKey) {
        if let Some(widget) = self.widget() {
            widget.set_focus(node);
        }
    }

    /// Expands the ancestors of `node` and scrolls it into view.
    pub async fn reveal(&self, node: &NodeKey) {
        let mut ancestors: Vec<NodeKey> = Vec::new();
        let mut current = self.parent_key(node);
        while let Some(key) = current {
            if key.is_root() || key == *node || ancestors.contains(&key) {
                break;
            }
            current = self.parent_key(&key);
            ancestors.push(key);
        }
        ancestors.reverse();
        self.expand(&ancestors).await;

        if let Some(widget) = self.widget() {
            widget.reveal(node).await;
        }
    }

    /// The widget moved its focus cursor.
    pub fn on_focused_node_changed(&self, node: Option<&NodeKey>) {
        let context = node.and_then(|key| self.node(key)).map(|node| NodeContext {
            node,
            view_id: self.id().to_string(),
        });
        self.shell().node_context = context;
    }

    /// The node holding the focus cursor, if any.
    pub fn node_context(&self) -> Option<NodeContext> {
        self.shell().node_context.clone()
    }
}
