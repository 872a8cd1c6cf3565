//! Error types

use thiserror::Error;

/// Errors surfaced by the connection layer.
///
/// Delegate registration and removal are total operations and never
/// produce an error; failures here come from configuration validation
/// or from the transport driver behind the connection.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// A known configuration option carried the wrong type or an
    /// out-of-range value
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The transport driver reported a failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// The link was torn down
    #[error("connection closed{}", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Closed {
        /// Optional close reason supplied by the peer or driver
        reason: Option<String>,
    },
}

impl ConnectionError {
    /// Build a transport error from any displayable cause
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }
}
