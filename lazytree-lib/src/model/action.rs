//! Action and menu types

use std::collections::BTreeMap;

/// Context key holding the id of the view a menu is resolved for.
pub const VIEW_KEY: &str = "view";

/// Context key holding the context value of the node a menu is resolved for.
pub const VIEW_ITEM_KEY: &str = "viewItem";

/// Menu group prefix that places an item in the inline (primary) set.
pub const INLINE_GROUP_PREFIX: &str = "inline";

/// A runnable action contributed to a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Action id; also the command id it runs.
    pub id: String,
    /// Display label.
    pub label: String,
}

impl Action {
    /// Creates a new action.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Menus the engine queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuId {
    /// Toolbar of the whole view.
    ViewTitle,
    /// Generic per-node menu.
    ViewItemContext,
    /// Domain-specific per-node menu.
    DataExplorerContext,
}

/// An action placed in a menu group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// The action.
    pub action: Action,
    /// Menu group, `inline*` groups are rendered inline.
    pub group: Option<String>,
}

impl MenuItem {
    /// Returns `true` if the item belongs to an inline group.
    pub fn is_inline(&self) -> bool {
        self.group
            .as_deref()
            .is_some_and(|group| group.starts_with(INLINE_GROUP_PREFIX))
    }
}

/// Primary (inline) and secondary (context menu) actions of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuActions {
    /// Inline actions.
    pub primary: Vec<Action>,
    /// Context menu actions.
    pub secondary: Vec<Action>,
}

impl MenuActions {
    /// Splits menu items by group into primary and secondary actions,
    /// preserving order.
    pub fn split(items: Vec<MenuItem>) -> Self {
        let mut actions = Self::default();
        for item in items {
            if item.is_inline() {
                actions.primary.push(item.action);
            } else {
                actions.secondary.push(item.action);
            }
        }
        actions
    }
}

/// Key/value context a menu query is evaluated against.
///
/// A fresh set is built for every query so keys never leak between nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextKeys {
    values: BTreeMap<String, String>,
}

impl ContextKeys {
    /// Creates an empty, query-scoped key set.
    pub fn scoped() -> Self {
        Self::default()
    }

    /// Adds a key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Gets a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns `true` if every condition holds.
    pub fn matches(&self, conditions: &[(String, String)]) -> bool {
        conditions
            .iter()
            .all(|(key, value)| self.get(key) == Some(value.as_str()))
    }
}

/// Argument passed to node actions, identifying the node they run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    /// Id of the view.
    pub tree_view_id: String,
    /// Handle of the node.
    pub tree_item_handle: String,
}

impl ActionContext {
    /// Creates a new context.
    pub fn new(tree_view_id: impl Into<String>, tree_item_handle: impl Into<String>) -> Self {
        Self {
            tree_view_id: tree_view_id.into(),
            tree_item_handle: tree_item_handle.into(),
        }
    }

    /// Converts to a command argument.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "treeViewId": self.tree_view_id,
            "treeItemHandle": self.tree_item_handle,
        })
    }
}
