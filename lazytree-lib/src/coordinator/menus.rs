//! Title and node actions

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::MenuRegistry;
use crate::error::CommandError;
use crate::model::{
    Action, ActionContext, ContextKeys, FileKind, MenuActions, MenuId, NodeKey, ROW_HEIGHT, RowTemplate, TreeNode,
    VIEW_ITEM_KEY, VIEW_KEY,
};
use crate::view::{TreeView, TreeViewEvent};

/// Id of the built-in collapse-all title action.
pub const COLLAPSE_ALL_ACTION_ID: &str = "vs.tree.collapse";

/// The built-in collapse-all title action.
pub fn collapse_all_action() -> Action {
    Action::new(COLLAPSE_ALL_ACTION_ID, "Collapse")
}

/// Concatenates action lists, dropping repeated ids. The first occurrence
/// wins and keeps its position.
pub fn merge_actions(lists: impl IntoIterator<Item = Vec<Action>>) -> Vec<Action> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|action| seen.insert(action.id.clone()))
        .collect()
}

/// Resolves per-node menus of one view.
pub struct TreeMenus {
    view_id: String,
    registry: Arc<dyn MenuRegistry>,
}

impl TreeMenus {
    /// Creates the resolver for `view_id`.
    pub fn new(view_id: &str, registry: Arc<dyn MenuRegistry>) -> Self {
        Self {
            view_id: view_id.to_string(),
            registry,
        }
    }

    /// Queries `menu` for a node with the given context value.
    ///
    /// Every query gets its own context keys.
    pub fn get_actions(&self, menu: MenuId, context_value: Option<&str>) -> MenuActions {
        let mut keys = ContextKeys::scoped().with(VIEW_KEY, self.view_id.as_str());
        if let Some(value) = context_value {
            keys = keys.with(VIEW_ITEM_KEY, value);
        }
        MenuActions::split(self.registry.menu_items(menu, &keys))
    }

    /// Primary and secondary actions of a node across the generic and the
    /// data explorer scopes.
    pub fn node_actions(&self, node: &TreeNode) -> MenuActions {
        let context = node.context_value.as_deref();
        let generic = self.get_actions(MenuId::ViewItemContext, context);
        let explorer = self.get_actions(MenuId::DataExplorerContext, context);
        MenuActions {
            primary: merge_actions([generic.primary, explorer.primary]),
            secondary: merge_actions([generic.secondary, explorer.secondary]),
        }
    }
}

/// Title bar actions of one view, cached until the registry announces a
/// change to the title menu.
pub struct TitleMenus {
    view_id: String,
    registry: Arc<dyn MenuRegistry>,
    actions: Arc<RwLock<MenuActions>>,
}

impl TitleMenus {
    /// Creates the cache and resolves the current actions.
    pub fn new(view_id: &str, registry: Arc<dyn MenuRegistry>) -> Self {
        let actions = Self::resolve(view_id, registry.as_ref());
        Self {
            view_id: view_id.to_string(),
            registry,
            actions: Arc::new(RwLock::new(actions)),
        }
    }

    fn resolve(view_id: &str, registry: &dyn MenuRegistry) -> MenuActions {
        let keys = ContextKeys::scoped().with(VIEW_KEY, view_id);
        MenuActions::split(registry.menu_items(MenuId::ViewTitle, &keys))
    }

    /// The cached actions.
    pub fn actions(&self) -> MenuActions {
        self.actions
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Keeps the cache current, announcing each update on `events`.
    pub fn track(&self, events: broadcast::Sender<TreeViewEvent>) -> JoinHandle<()> {
        let mut changes = self.registry.subscribe();
        let registry = Arc::clone(&self.registry);
        let actions = Arc::clone(&self.actions);
        let view_id = self.view_id.clone();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(MenuId::ViewTitle) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let resolved = Self::resolve(&view_id, registry.as_ref());
                *actions.write().unwrap_or_else(PoisonError::into_inner) = resolved;
                log::debug!("Title actions of view '{}' changed", view_id);
                let _ = events.send(TreeViewEvent::DidChangeActions);
            }
        })
    }
}

/// Everything a row needs to render one node.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBinding {
    /// The node.
    pub node: TreeNode,
    /// Visual template.
    pub template: RowTemplate,
    /// Icon kind.
    pub file_kind: FileKind,
    /// Whether to show an expand affordance.
    pub has_children: bool,
    /// Inline actions.
    pub actions: Vec<Action>,
    /// Row height in pixels.
    pub row_height: u32,
}

impl TreeView {
    // -------------------------------------------------------------------------
    // Title actions
    // -------------------------------------------------------------------------

    /// Inline title actions, followed by collapse-all when enabled.
    pub fn primary_actions(&self) -> Vec<Action> {
        let mut actions = self.inner.title.actions().primary;
        if self.shell().show_collapse_all {
            actions.push(collapse_all_action());
        }
        actions
    }

    /// Title actions shown in the overflow menu.
    pub fn secondary_actions(&self) -> Vec<Action> {
        self.inner.title.actions().secondary
    }

    /// Shows or hides the collapse-all title action.
    pub fn set_show_collapse_all_action(&self, show: bool) {
        let changed = {
            let mut shell = self.shell();
            std::mem::replace(&mut shell.show_collapse_all, show) != show
        };
        if changed {
            self.emit(TreeViewEvent::DidChangeActions);
        }
    }

    /// Runs a title action. Collapse-all is handled by the view; any other
    /// action runs as a command with the view id as argument.
    pub async fn run_title_action(&self, id: &str) -> Result<(), CommandError> {
        if id == COLLAPSE_ALL_ACTION_ID {
            self.collapse_all();
            return Ok(());
        }
        let argument = serde_json::json!({ "treeViewId": self.id() });
        self.inner.commands.execute_command(id, vec![argument]).await
    }

    // -------------------------------------------------------------------------
    // Node actions
    // -------------------------------------------------------------------------

    /// Inline actions of a node.
    pub fn resource_actions(&self, node: &NodeKey) -> Vec<Action> {
        self.node_actions(node).primary
    }

    /// Context menu actions of a node.
    pub fn resource_context_actions(&self, node: &NodeKey) -> Vec<Action> {
        self.node_actions(node).secondary
    }

    fn node_actions(&self, key: &NodeKey) -> MenuActions {
        match self.node(key) {
            Some(node) if !key.is_root() => self.inner.menus.node_actions(&node),
            _ => MenuActions::default(),
        }
    }

    /// Opens the context menu of a node: the focus cursor moves to it and
    /// its context menu actions are returned. Empty means no menu.
    pub fn context_menu(&self, node: &NodeKey) -> Vec<Action> {
        if self.cache().contains(node) {
            self.move_cursor(node);
        }
        self.resource_context_actions(node)
    }

    /// Runs `action` on `node`.
    ///
    /// The first argument is the node's action context. When the node is
    /// part of a multi-selection, the contexts of the other selected nodes
    /// follow.
    pub async fn run_item_action(&self, action: &Action, node: &NodeKey) -> Result<(), CommandError> {
        let Some(handle) = node.handle() else {
            return Err(CommandError::failed(&action.id, "the root has no actions"));
        };
        let mut arguments = vec![ActionContext::new(self.id(), handle).to_value()];

        let selection = self.widget().map(|widget| widget.selection()).unwrap_or_default();
        if selection.len() > 1 && selection.contains(node) {
            arguments.extend(
                selection
                    .iter()
                    .filter(|key| *key != node)
                    .filter_map(NodeKey::handle)
                    .map(|other| ActionContext::new(self.id(), other).to_value()),
            );
        }

        log::debug!("Running action '{}' on '{}' with {} contexts", action.id, node, arguments.len());
        self.inner.commands.execute_command(&action.id, arguments).await
    }

    // -------------------------------------------------------------------------
    // Render binding
    // -------------------------------------------------------------------------

    /// Resolves what a row needs to render `node`.
    pub fn bind_row(&self, key: &NodeKey) -> Option<RowBinding> {
        if key.is_root() {
            return None;
        }
        let node = self.node(key)?;
        Some(RowBinding {
            template: RowTemplate::for_node(&node),
            file_kind: FileKind::for_node(&node),
            has_children: self.has_children(key),
            actions: self.resource_actions(key),
            row_height: ROW_HEIGHT,
            node,
        })
    }
}
