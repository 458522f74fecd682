//! Messages, empty state, layout and focus

use super::TreeView;
use crate::model::NodeKey;

/// Message shown in place of, or above, the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMessage {
    /// Plain text.
    Text(String),
    /// Markdown source, rendered by the widget.
    Markdown(String),
}

/// Shown when no data provider is registered for a view.
pub const NO_DATA_PROVIDER_MESSAGE: &str =
    "There is no data provider registered that can provide view data.";

impl ViewMessage {
    /// The built-in "no data provider" message.
    pub fn no_data_provider() -> Self {
        Self::Text(NO_DATA_PROVIDER_MESSAGE.to_string())
    }
}

impl TreeView {
    /// The message set by the view's owner.
    pub fn message(&self) -> Option<ViewMessage> {
        self.shell().message.clone()
    }

    /// Sets or clears the owner message. It takes precedence over the
    /// "no data provider" message.
    pub fn set_message(&self, message: Option<ViewMessage>) {
        self.shell().message = message;
        self.update_message();
    }

    /// The message currently shown, if any.
    pub fn shown_message(&self) -> Option<ViewMessage> {
        self.shell().shown_message.clone()
    }

    pub(crate) fn update_message(&self) {
        let owner = self.shell().message.clone();
        let message = owner.or_else(|| (!self.has_data_provider()).then(ViewMessage::no_data_provider));
        match message {
            Some(message) => self.show_message(message),
            None => self.hide_message(),
        }
        self.update_content_areas();
    }

    fn show_message(&self, message: ViewMessage) {
        {
            let mut shell = self.shell();
            if shell.shown_message.as_ref() == Some(&message) {
                return;
            }
            shell.shown_message = Some(message.clone());
        }
        if let Some(widget) = self.widget() {
            widget.show_message(Some(&message));
        }
        self.relayout();
    }

    fn hide_message(&self) {
        if self.shell().shown_message.take().is_none() {
            return;
        }
        if let Some(widget) = self.widget() {
            widget.show_message(None);
        }
        self.relayout();
    }

    /// Hides the tree body when a message is shown over an empty tree.
    ///
    /// Suppressed while a batched refresh runs: the root is transiently
    /// empty then and the body must not flash.
    pub(crate) fn update_content_areas(&self) {
        let Some(widget) = self.widget() else { return };
        let tree_empty = self
            .cache()
            .children(&NodeKey::Root)
            .is_none_or(|children| children.is_empty());
        let hidden = {
            let shell = self.shell();
            shell.shown_message.is_some() && tree_empty && shell.refreshing == 0
        };
        widget.set_body_hidden(hidden);
    }

    /// Lays the view out with the given total height. Zero is ignored.
    pub fn layout(&self, height: u32) {
        if height == 0 {
            return;
        }
        self.shell().size = height;
        self.relayout();
    }

    fn relayout(&self) {
        let size = self.shell().size;
        if size == 0 {
            return;
        }
        if let Some(widget) = self.widget() {
            widget.layout(size.saturating_sub(widget.message_height()));
        }
    }

    /// Moves focus into the view.
    ///
    /// With rows to show, the first selected node is revealed and focus
    /// goes to the tree; otherwise the container takes focus.
    pub async fn focus(&self) {
        let Some(widget) = self.widget() else { return };
        let has_rows = self
            .cache()
            .children(&NodeKey::Root)
            .is_some_and(|children| !children.is_empty());
        if has_rows {
            if let Some(selected) = widget.selection().first() {
                widget.reveal(selected).await;
            }
            widget.focus();
        } else {
            widget.focus_container();
        }
    }

    /// Records whether the view holds input focus.
    pub fn on_focus_changed(&self, focused: bool) {
        self.shell().focused = focused;
    }
}
