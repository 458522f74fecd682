//! Extension host error types

/// Errors from the extension host while activating contributors of a view.
#[derive(Debug, Clone, thiserror::Error)]
#[error("activation of '{event}' failed: {message}")]
pub struct HostError {
    /// Activation event name (e.g. `onView:connections`).
    pub event: String,
    /// Error message.
    pub message: String,
}

impl HostError {
    /// Creates a new host error.
    pub fn new(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            message: message.into(),
        }
    }
}
