//! Provider error types

use std::time::Duration;

/// Errors a data provider can report for a single fetch.
///
/// These never reach consumers of the view: the data source absorbs them
/// at the node boundary and turns them into a retryable collapsed node.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider tried and failed.
    #[error("provider '{provider}' failed: {message}")]
    Failed {
        /// Provider that produced the failure.
        provider: String,
        /// Error message.
        message: String,
    },

    /// No provider is registered under the requested id.
    #[error("provider '{0}' is not registered")]
    Unavailable(String),

    /// The provider did not answer in time.
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Creates a new failure for the given provider.
    pub fn failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if asking again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Failed { .. } => true,
            Self::Timeout(_) => true,
            Self::Unavailable(_) => false,
        }
    }
}
