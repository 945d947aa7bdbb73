/*
[INPUT]:  Error sources (host capabilities, wallet connector, serialization, config)
[OUTPUT]: Structured error types with classification hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or host capabilities
*/

use thiserror::Error;

use crate::session::StateError;

/// Raw failure reported by a wallet connector.
///
/// The text is whatever the underlying wallet library produced; it is
/// only meaningful to the classifier, never shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConnectorError {
    pub message: String,
}

impl ConnectorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Main error type for the wallet auth bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A host capability (navigation, postMessage, bridge, storage) failed
    #[error("Host capability failed: {0}")]
    Host(String),

    /// Wallet connector call failed
    #[error("Wallet connector failed: {0}")]
    Connector(#[from] ConnectorError),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Payload missing or malformed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session state machine rejected an event
    #[error(transparent)]
    State(#[from] StateError),
}

impl BridgeError {
    /// Check if the failure came from the host page rather than our own logic
    pub fn is_host_error(&self) -> bool {
        matches!(self, BridgeError::Host(_))
    }

    /// Check if a user retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Host(_) | BridgeError::Connector(_))
    }

    /// Create a host error from any displayable cause
    pub fn host(message: impl Into<String>) -> Self {
        BridgeError::Host(message.into())
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let host_err = BridgeError::host("navigation blocked");
        assert!(host_err.is_retryable());
        assert!(host_err.is_host_error());

        let config_err = BridgeError::Config("bad".to_string());
        assert!(!config_err.is_retryable());
        assert!(!config_err.is_host_error());
    }

    #[test]
    fn test_connector_error_converts() {
        let err: BridgeError = ConnectorError::new("User rejected the request.").into();
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Wallet connector failed: User rejected the request."
        );
    }
}
