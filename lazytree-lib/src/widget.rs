//! Presentation widget contract
//!
//! The widget virtualizes, scrolls and renders rows; the engine tells it
//! what changed and the widget reports interaction back through
//! [`TreeView`](crate::view::TreeView)'s `on_*` methods. The widget reads
//! the node graph but never mutates it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{NodeKey, TreeNode};
use crate::view::ViewMessage;

/// Origin of a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionSource {
    /// The user selected rows.
    #[default]
    User,
    /// Application code called `set_selection`.
    Api,
}

/// Input device behind an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    /// Keyboard navigation.
    Keyboard,
    /// Mouse click; `click_count` is 2 for a double click.
    Mouse {
        /// Number of consecutive clicks.
        click_count: u8,
    },
    /// No input device (programmatic).
    Programmatic,
}

/// Raw selection notification from the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    /// Selected nodes, in selection order.
    pub selection: Vec<NodeKey>,
    /// Who changed the selection.
    pub source: SelectionSource,
    /// Input device that caused it.
    pub origin: InputOrigin,
    /// `true` if the change came from clicking an expand/collapse twistie.
    pub twistie_click: bool,
}

impl SelectionChange {
    /// A selection made by the user with the given input.
    pub fn user(selection: Vec<NodeKey>, origin: InputOrigin) -> Self {
        Self {
            selection,
            source: SelectionSource::User,
            origin,
            twistie_click: false,
        }
    }

    /// The echo of a `set_selection` call.
    pub fn api(selection: Vec<NodeKey>) -> Self {
        Self {
            selection,
            source: SelectionSource::Api,
            origin: InputOrigin::Programmatic,
            twistie_click: false,
        }
    }

    /// A selection caused by clicking a twistie.
    pub fn twistie(selection: Vec<NodeKey>) -> Self {
        Self {
            selection,
            source: SelectionSource::User,
            origin: InputOrigin::Mouse { click_count: 1 },
            twistie_click: true,
        }
    }
}

/// The virtualized tree widget and its surrounding view body.
#[async_trait]
pub trait TreeWidget: Send + Sync {
    /// Binds the widget to the root sentinel.
    fn set_input(&self, root: &TreeNode);

    /// Re-renders `node` and its visible descendants from the cache.
    fn refresh(&self, node: &NodeKey);

    /// Shows `node` expanded.
    fn expand(&self, node: &NodeKey);

    /// Shows `node` collapsed.
    fn collapse(&self, node: &NodeKey);

    /// Currently selected nodes.
    fn selection(&self) -> Vec<NodeKey>;

    /// Replaces the selection.
    fn set_selection(&self, nodes: &[NodeKey], source: SelectionSource);

    /// Moves the keyboard focus cursor to `node`.
    fn set_focus(&self, node: &NodeKey);

    /// Scrolls `node` into view.
    async fn reveal(&self, node: &NodeKey);

    /// Moves input focus into the tree rows.
    fn focus(&self);

    /// Moves input focus to the view container.
    fn focus_container(&self);

    /// Shows or hides the whole widget.
    fn set_visible(&self, visible: bool);

    /// Shows a message above the tree, or hides it with `None`.
    fn show_message(&self, message: Option<&ViewMessage>);

    /// Hides the tree body (used while an empty view shows a message).
    fn set_body_hidden(&self, hidden: bool);

    /// Height currently taken by the message area.
    fn message_height(&self) -> u32;

    /// Lays out the tree body with the given height.
    fn layout(&self, body_height: u32);
}

/// Creates the widget on first activation of a view.
pub type WidgetFactory = Box<dyn Fn() -> Arc<dyn TreeWidget> + Send + Sync>;
