//! Shared fixtures for integration tests: a scriptable provider, a widget
//! that records every call, and recording command/host services.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use lazytree_lib::error::{CommandError, HostError, ProviderError};
use lazytree_lib::host::{CommandService, ExtensionHost};
use lazytree_lib::provider::TreeDataProvider;
use lazytree_lib::view::ViewMessage;
use lazytree_lib::widget::{SelectionSource, TreeWidget};
use lazytree_lib::{CollapsibleState, NodeKey, TreeNode, TreeView, TreeViewConfig, TreeViewEvent};

// ============================================================================
// Nodes
// ============================================================================

pub fn folder(handle: &str) -> TreeNode {
    TreeNode::new(handle, handle).collapsible(CollapsibleState::Collapsed)
}

pub fn leaf(handle: &str) -> TreeNode {
    TreeNode::new(handle, handle)
}

pub fn key(handle: &str) -> NodeKey {
    NodeKey::item(handle)
}

pub fn handles(nodes: &[TreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.handle.as_str()).collect()
}

// ============================================================================
// Provider
// ============================================================================

/// Provider answering from a parent handle → children table.
#[derive(Default)]
pub struct MockProvider {
    name: String,
    children: Mutex<HashMap<Option<String>, Vec<TreeNode>>>,
    calls: Mutex<Vec<Option<String>>>,
    failing: Mutex<HashSet<Option<String>>>,
    delay: Mutex<Option<Duration>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Sets the top-level nodes.
    pub fn roots(&self, nodes: Vec<TreeNode>) -> &Self {
        self.children.lock().unwrap().insert(None, nodes);
        self
    }

    /// Sets the children of `parent`.
    pub fn children(&self, parent: &str, nodes: Vec<TreeNode>) -> &Self {
        self.children.lock().unwrap().insert(Some(parent.to_string()), nodes);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail(&self, parent: &str) {
        self.failing.lock().unwrap().insert(Some(parent.to_string()));
    }

    pub fn recover(&self, parent: &str) {
        self.failing.lock().unwrap().remove(&Some(parent.to_string()));
    }

    pub fn fail_top_level(&self) {
        self.failing.lock().unwrap().insert(None);
    }

    pub fn recover_top_level(&self) {
        self.failing.lock().unwrap().remove(&None);
    }

    /// Calls made for `parent` (`None` for the top level).
    pub fn calls_for(&self, parent: Option<&str>) -> usize {
        let parent = parent.map(str::to_string);
        self.calls.lock().unwrap().iter().filter(|c| **c == parent).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TreeDataProvider for MockProvider {
    async fn get_children(&self, node: Option<&TreeNode>) -> Result<Vec<TreeNode>, ProviderError> {
        let parent = node.map(|n| n.handle.clone());
        self.calls.lock().unwrap().push(parent.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(&parent) {
            return Err(ProviderError::failed(&self.name, "scripted failure"));
        }
        Ok(self.children.lock().unwrap().get(&parent).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Widget
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    SetInput,
    Refresh(NodeKey),
    Expand(NodeKey),
    Collapse(NodeKey),
    SetSelection(Vec<NodeKey>, SelectionSource),
    SetFocus(NodeKey),
    Reveal(NodeKey),
    Focus,
    FocusContainer,
    SetVisible(bool),
    ShowMessage(Option<ViewMessage>),
    SetBodyHidden(bool),
    Layout(u32),
}

/// Widget that records every call and keeps a selection.
#[derive(Default)]
pub struct RecordingWidget {
    calls: Mutex<Vec<WidgetCall>>,
    selection: Mutex<Vec<NodeKey>>,
    message_shown: Mutex<bool>,
}

pub const MESSAGE_HEIGHT: u32 = 20;

impl RecordingWidget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, call: WidgetCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<WidgetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn refreshes(&self) -> Vec<NodeKey> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WidgetCall::Refresh(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    /// The last body visibility decision.
    pub fn body_hidden(&self) -> Option<bool> {
        self.calls().into_iter().rev().find_map(|c| match c {
            WidgetCall::SetBodyHidden(hidden) => Some(hidden),
            _ => None,
        })
    }

    /// Simulates the user selecting rows, without recording a call.
    pub fn select(&self, nodes: &[NodeKey]) {
        *self.selection.lock().unwrap() = nodes.to_vec();
    }
}

#[async_trait]
impl TreeWidget for RecordingWidget {
    fn set_input(&self, _root: &TreeNode) {
        self.record(WidgetCall::SetInput);
    }

    fn refresh(&self, node: &NodeKey) {
        self.record(WidgetCall::Refresh(node.clone()));
    }

    fn expand(&self, node: &NodeKey) {
        self.record(WidgetCall::Expand(node.clone()));
    }

    fn collapse(&self, node: &NodeKey) {
        self.record(WidgetCall::Collapse(node.clone()));
    }

    fn selection(&self) -> Vec<NodeKey> {
        self.selection.lock().unwrap().clone()
    }

    fn set_selection(&self, nodes: &[NodeKey], source: SelectionSource) {
        *self.selection.lock().unwrap() = nodes.to_vec();
        self.record(WidgetCall::SetSelection(nodes.to_vec(), source));
    }

    fn set_focus(&self, node: &NodeKey) {
        self.record(WidgetCall::SetFocus(node.clone()));
    }

    async fn reveal(&self, node: &NodeKey) {
        self.record(WidgetCall::Reveal(node.clone()));
    }

    fn focus(&self) {
        self.record(WidgetCall::Focus);
    }

    fn focus_container(&self) {
        self.record(WidgetCall::FocusContainer);
    }

    fn set_visible(&self, visible: bool) {
        self.record(WidgetCall::SetVisible(visible));
    }

    fn show_message(&self, message: Option<&ViewMessage>) {
        *self.message_shown.lock().unwrap() = message.is_some();
        self.record(WidgetCall::ShowMessage(message.cloned()));
    }

    fn set_body_hidden(&self, hidden: bool) {
        self.record(WidgetCall::SetBodyHidden(hidden));
    }

    fn message_height(&self) -> u32 {
        if *self.message_shown.lock().unwrap() { MESSAGE_HEIGHT } else { 0 }
    }

    fn layout(&self, body_height: u32) {
        self.record(WidgetCall::Layout(body_height));
    }
}

// ============================================================================
// Host services
// ============================================================================

/// Command service recording every execution.
#[derive(Default)]
pub struct RecordingCommands {
    executed: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingCommands {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn executed(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.executed().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl CommandService for RecordingCommands {
    async fn execute_command(&self, id: &str, arguments: Vec<serde_json::Value>) -> Result<(), CommandError> {
        self.executed.lock().unwrap().push((id.to_string(), arguments));
        if self.failing.lock().unwrap().contains(id) {
            return Err(CommandError::failed(id, "scripted failure"));
        }
        Ok(())
    }
}

/// Extension host recording activation events, optionally slow or failing.
#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<String>>,
    delay: Option<Duration>,
    fails: bool,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fails: true,
            ..Default::default()
        })
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtensionHost for RecordingHost {
    async fn activate_by_event(&self, event: &str) -> Result<(), HostError> {
        self.events.lock().unwrap().push(event.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fails {
            return Err(HostError::new(event, "contributor crashed"));
        }
        Ok(())
    }
}

// ============================================================================
// Views
// ============================================================================

pub const VIEW_ID: &str = "connections";

/// Builds a view with a recording widget and no activation wait.
pub fn view_with(config: TreeViewConfig) -> (TreeView, Arc<RecordingWidget>) {
    let widget = RecordingWidget::new();
    let factory = Arc::clone(&widget);
    let view = TreeView::builder(VIEW_ID, move || factory.clone() as Arc<dyn TreeWidget>)
        .config(config)
        .build();
    (view, widget)
}

/// A visible view over `provider`, with the top level loaded.
pub async fn shown_view(provider: Arc<MockProvider>) -> (TreeView, Arc<RecordingWidget>) {
    let (view, widget) = view_with(TreeViewConfig::no_wait());
    view.set_data_provider(Some(provider)).await;
    view.set_visibility(true).await;
    (view, widget)
}

/// Events received so far.
pub fn drain(events: &mut broadcast::Receiver<TreeViewEvent>) -> Vec<TreeViewEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

/// Lets spawned view tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
