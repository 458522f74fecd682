//! Headless widget that logs what a real tree widget would render

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lazytree_lib::view::ViewMessage;
use lazytree_lib::widget::{SelectionSource, TreeWidget};
use lazytree_lib::{NodeKey, TreeNode};

/// Height the message area takes when a message is shown.
const MESSAGE_HEIGHT: u32 = 2;

#[derive(Default)]
pub struct LogWidget {
    selection: Mutex<Vec<NodeKey>>,
    message: Mutex<Option<ViewMessage>>,
}

impl LogWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user selecting rows.
    pub fn select(&self, nodes: &[NodeKey]) {
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = nodes.to_vec();
    }

    /// The message shown above the tree, if any.
    pub fn message(&self) -> Option<ViewMessage> {
        self.message.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl TreeWidget for LogWidget {
    fn set_input(&self, root: &TreeNode) {
        log::debug!("widget: input {}", root.label);
    }

    fn refresh(&self, node: &NodeKey) {
        log::debug!("widget: refresh {}", node);
    }

    fn expand(&self, node: &NodeKey) {
        log::debug!("widget: expand {}", node);
    }

    fn collapse(&self, node: &NodeKey) {
        log::debug!("widget: collapse {}", node);
    }

    fn selection(&self) -> Vec<NodeKey> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_selection(&self, nodes: &[NodeKey], source: SelectionSource) {
        log::debug!("widget: select {} nodes ({:?})", nodes.len(), source);
        self.select(nodes);
    }

    fn set_focus(&self, node: &NodeKey) {
        log::debug!("widget: focus cursor on {}", node);
    }

    async fn reveal(&self, node: &NodeKey) {
        log::debug!("widget: reveal {}", node);
    }

    fn focus(&self) {
        log::debug!("widget: focus tree");
    }

    fn focus_container(&self) {
        log::debug!("widget: focus container");
    }

    fn set_visible(&self, visible: bool) {
        log::debug!("widget: visible {}", visible);
    }

    fn show_message(&self, message: Option<&ViewMessage>) {
        log::debug!("widget: message {:?}", message);
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = message.cloned();
    }

    fn set_body_hidden(&self, hidden: bool) {
        log::debug!("widget: body hidden {}", hidden);
    }

    fn message_height(&self) -> u32 {
        if self.message().is_some() { MESSAGE_HEIGHT } else { 0 }
    }

    fn layout(&self, body_height: u32) {
        log::debug!("widget: layout {} rows", body_height);
    }
}
