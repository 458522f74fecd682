//! Tree node types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a node within one provider's namespace.
pub type Handle = String;

/// Handle reported for the root sentinel.
///
/// The engine never looks the root up by this handle; providers are free
/// to hand out the same string for their own nodes.
pub const ROOT_HANDLE: &str = "0";

/// Row height, in pixels, of every rendered node.
pub const ROW_HEIGHT: u32 = 22;

/// Whether a node can hold children, and its initial expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollapsibleState {
    /// Leaf; children are never fetched.
    #[default]
    None,
    /// Container, initially collapsed.
    Collapsed,
    /// Container, expanded on first render.
    Expanded,
}

impl CollapsibleState {
    /// Returns `true` for `Collapsed` and `Expanded`.
    pub fn is_container(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Command executed when a node is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Arguments forwarded to the command handler.
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

impl Command {
    /// Creates a command without arguments.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            arguments: Vec::new(),
        }
    }

    /// Adds an argument.
    pub fn with_argument(mut self, argument: serde_json::Value) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// A single tree entry as supplied by a data provider.
///
/// Cached children are not part of the node itself; the view's cache owns
/// them and tracks whether they were never fetched, are being fetched, or
/// were fetched (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique, stable identifier.
    pub handle: Handle,
    /// Handle of the logical parent, `None` for top-level nodes.
    #[serde(default)]
    pub parent_handle: Option<Handle>,
    /// Display label.
    pub label: String,
    /// Secondary text shown next to the label.
    #[serde(default)]
    pub description: Option<String>,
    /// Hover text.
    #[serde(default)]
    pub tooltip: Option<String>,
    /// Leaf or container.
    #[serde(default)]
    pub collapsible_state: CollapsibleState,
    /// Key used to resolve the node's actions.
    #[serde(default)]
    pub context_value: Option<String>,
    /// Delegated provider responsible for this node's children.
    #[serde(default)]
    pub child_provider_id: Option<String>,
    /// Provider that produced the node (drives the row template).
    #[serde(default)]
    pub provider_handle: Option<String>,
    /// Command run when the node is opened.
    #[serde(default)]
    pub command: Option<Command>,
}

impl TreeNode {
    /// Creates a leaf node.
    pub fn new(handle: impl Into<Handle>, label: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            parent_handle: None,
            label: label.into(),
            description: None,
            tooltip: None,
            collapsible_state: CollapsibleState::None,
            context_value: None,
            child_provider_id: None,
            provider_handle: None,
            command: None,
        }
    }

    /// The root sentinel. Never displayed; its children are the
    /// provider's top-level nodes.
    pub fn root() -> Self {
        Self::new(ROOT_HANDLE, "root").collapsible(CollapsibleState::Expanded)
    }

    /// Sets the collapsible state.
    pub fn collapsible(mut self, state: CollapsibleState) -> Self {
        self.collapsible_state = state;
        self
    }

    /// Sets the parent handle.
    pub fn with_parent(mut self, parent: impl Into<Handle>) -> Self {
        self.parent_handle = Some(parent.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Sets the context value.
    pub fn with_context_value(mut self, value: impl Into<String>) -> Self {
        self.context_value = Some(value.into());
        self
    }

    /// Delegates this node's children to another provider.
    pub fn with_child_provider(mut self, provider: impl Into<String>) -> Self {
        self.child_provider_id = Some(provider.into());
        self
    }

    /// Sets the originating provider.
    pub fn with_provider_handle(mut self, provider: impl Into<String>) -> Self {
        self.provider_handle = Some(provider.into());
        self
    }

    /// Sets the open command.
    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Returns `true` if the node can never have children.
    pub fn is_leaf(&self) -> bool {
        !self.collapsible_state.is_container()
    }

    /// The key addressing this node in a view.
    pub fn key(&self) -> NodeKey {
        NodeKey::Item(self.handle.clone())
    }
}

/// Addresses a node in a view.
///
/// The root sentinel is identified by variant rather than by handle, so a
/// provider node whose handle equals [`ROOT_HANDLE`] is still an ordinary
/// node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// The root sentinel.
    Root,
    /// A provider node.
    Item(Handle),
}

impl NodeKey {
    /// Key for a provider node.
    pub fn item(handle: impl Into<Handle>) -> Self {
        Self::Item(handle.into())
    }

    /// Returns `true` for the root sentinel.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The provider handle, `None` for the root.
    pub fn handle(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Item(handle) => Some(handle),
        }
    }
}

impl From<&TreeNode> for NodeKey {
    fn from(node: &TreeNode) -> Self {
        node.key()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "<root>"),
            Self::Item(handle) => write!(f, "{}", handle),
        }
    }
}

/// Visual template a row is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTemplate {
    /// Generic tree row.
    Default,
    /// Row for nodes produced by the `mssql` provider.
    Mssql,
}

impl RowTemplate {
    /// Resolves the template for a node.
    pub fn for_node(node: &TreeNode) -> Self {
        match node.provider_handle.as_deref() {
            Some(provider) if provider.eq_ignore_ascii_case("mssql") => Self::Mssql,
            _ => Self::Default,
        }
    }
}

/// File-like kind used for icon resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Container node.
    Folder,
    /// Leaf node.
    File,
}

impl FileKind {
    /// Resolves the kind for a node.
    pub fn for_node(node: &TreeNode) -> Self {
        if node.collapsible_state.is_container() {
            Self::Folder
        } else {
            Self::File
        }
    }
}
