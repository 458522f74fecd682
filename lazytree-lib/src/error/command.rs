//! Command error types

/// Errors raised while executing a command or contributed action.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommandError {
    /// No handler is registered for the command.
    #[error("command '{0}' not found")]
    NotFound(String),

    /// The handler ran and failed.
    #[error("command '{id}' failed: {message}")]
    Failed {
        /// Command id.
        id: String,
        /// Error message.
        message: String,
    },
}

impl CommandError {
    /// Creates a new failure for the given command.
    pub fn failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            message: message.into(),
        }
    }
}
