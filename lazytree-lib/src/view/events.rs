//! View events and owned subscriptions

use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::model::TreeNode;

/// Domain events raised by a view.
///
/// Obtained through [`TreeView::subscribe`](super::TreeView::subscribe).
#[derive(Debug, Clone, PartialEq)]
pub enum TreeViewEvent {
    /// A node was expanded.
    DidExpandItem(TreeNode),
    /// A node was collapsed.
    DidCollapseItem(TreeNode),
    /// The user changed the selection.
    DidChangeSelection(Vec<TreeNode>),
    /// The view was shown or hidden.
    DidChangeVisibility(bool),
    /// The title actions changed.
    DidChangeActions,
}

/// Background tasks owned by a view; aborted when the view is disposed.
#[derive(Default)]
pub(crate) struct Subscriptions {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Subscriptions {
    pub(crate) fn push(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    pub(crate) fn abort_all(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.abort_all();
    }
}
