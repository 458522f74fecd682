//! Host services used by the view
//!
//! Command execution, extension activation and environment (theme and
//! configuration) notifications.

use async_trait::async_trait;

use crate::error::{CommandError, HostError};

/// Executes commands by id.
#[async_trait]
pub trait CommandService: Send + Sync {
    /// Runs the command with the given arguments.
    async fn execute_command(&self, id: &str, arguments: Vec<serde_json::Value>) -> Result<(), CommandError>;
}

/// Activates contributors that register providers for a view.
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Activates everything listening for `event`.
    async fn activate_by_event(&self, event: &str) -> Result<(), HostError>;
}

/// Environment changes a view reacts to with a soft refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentChange {
    /// The color theme changed.
    ColorTheme,
    /// The file icon theme changed.
    FileIconTheme,
    /// Configuration changed; holds the affected keys.
    Configuration(Vec<String>),
}

impl EnvironmentChange {
    /// Returns `true` if the change should re-render a view whose
    /// decorations are controlled by `decorations_key`.
    pub fn requires_rerender(&self, decorations_key: &str) -> bool {
        match self {
            Self::ColorTheme | Self::FileIconTheme => true,
            Self::Configuration(keys) => keys.iter().any(|key| {
                key == decorations_key || key.starts_with(&format!("{}.", decorations_key))
            }),
        }
    }
}

/// Command service used when none is configured; every command is unknown.
#[derive(Debug, Default)]
pub struct UnhandledCommands;

#[async_trait]
impl CommandService for UnhandledCommands {
    async fn execute_command(&self, id: &str, _arguments: Vec<serde_json::Value>) -> Result<(), CommandError> {
        Err(CommandError::NotFound(id.to_string()))
    }
}

/// Extension host used when none is configured; activation is immediate.
#[derive(Debug, Default)]
pub struct NoopHost;

#[async_trait]
impl ExtensionHost for NoopHost {
    async fn activate_by_event(&self, _event: &str) -> Result<(), HostError> {
        Ok(())
    }
}
