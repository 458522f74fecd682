//! View configuration

use std::time::Duration;

/// Which click opens a node's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// A single click opens.
    #[default]
    SingleClick,
    /// Only a double click opens.
    DoubleClick,
}

/// Configuration for a [`TreeView`](super::TreeView).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lazytree_lib::view::{OpenMode, TreeViewConfig};
///
/// let config = TreeViewConfig::default()
///     .with_activation_wait(Duration::from_millis(500))
///     .with_open_mode(OpenMode::DoubleClick)
///     .with_collapse_all_action(true);
/// ```
#[derive(Debug, Clone)]
pub struct TreeViewConfig {
    /// How long first activation waits for contributors to register a
    /// provider before the "no data provider" message is re-evaluated.
    ///
    /// Default: 2 seconds
    pub activation_wait: Duration,

    /// Click behaviour for nodes with a command.
    ///
    /// Default: single click
    pub open_mode: OpenMode,

    /// Whether the title actions include a collapse-all action.
    ///
    /// Default: false
    pub show_collapse_all_action: bool,

    /// Buffer size of the view event channel.
    ///
    /// Default: 64
    pub event_capacity: usize,

    /// Configuration key whose changes re-render the view.
    ///
    /// Default: `explorer.decorations`
    pub decorations_key: String,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            activation_wait: Duration::from_millis(2000),
            open_mode: OpenMode::SingleClick,
            show_collapse_all_action: false,
            event_capacity: 64,
            decorations_key: "explorer.decorations".to_string(),
        }
    }
}

impl TreeViewConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config whose activation does not wait at all.
    pub fn no_wait() -> Self {
        Self::default().with_activation_wait(Duration::ZERO)
    }

    /// Sets the activation wait.
    pub fn with_activation_wait(mut self, wait: Duration) -> Self {
        self.activation_wait = wait;
        self
    }

    /// Sets the open mode.
    pub fn with_open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Shows or hides the collapse-all title action.
    pub fn with_collapse_all_action(mut self, show: bool) -> Self {
        self.show_collapse_all_action = show;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Sets the decorations configuration key.
    pub fn with_decorations_key(mut self, key: impl Into<String>) -> Self {
        self.decorations_key = key.into();
        self
    }
}
