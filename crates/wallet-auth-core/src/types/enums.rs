/*
[INPUT]:  Session vocabulary and host message schema
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - closed enumerations shared across the crate
[UPDATE]: When the error vocabulary or session steps change
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Step of an authentication session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStep {
    Selecting,
    Connecting,
    Signing,
    Success,
    Error,
}

impl AuthStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, AuthStep::Success | AuthStep::Error)
    }
}

/// Closed set of failure codes surfaced to users and hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UserRejected,
    WalletNotDetected,
    WalletLocked,
    NetworkError,
    SignatureFailed,
    UnsupportedChain,
    Timeout,
    WalletUnavailable,
    ConnectionFailed,
    UnknownError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::UserRejected,
        ErrorCode::WalletNotDetected,
        ErrorCode::WalletLocked,
        ErrorCode::NetworkError,
        ErrorCode::SignatureFailed,
        ErrorCode::UnsupportedChain,
        ErrorCode::Timeout,
        ErrorCode::WalletUnavailable,
        ErrorCode::ConnectionFailed,
        ErrorCode::UnknownError,
    ];

    /// Wire name, e.g. `USER_REJECTED`
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UserRejected => "USER_REJECTED",
            ErrorCode::WalletNotDetected => "WALLET_NOT_DETECTED",
            ErrorCode::WalletLocked => "WALLET_LOCKED",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::SignatureFailed => "SIGNATURE_FAILED",
            ErrorCode::UnsupportedChain => "UNSUPPORTED_CHAIN",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::WalletUnavailable => "WALLET_UNAVAILABLE",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Fixed user-facing message for this code
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCode::UserRejected => "User rejected the connection request",
            ErrorCode::WalletNotDetected => "No compatible wallet detected in browser",
            ErrorCode::WalletLocked => "Wallet is locked, please unlock it",
            ErrorCode::NetworkError => "Network connection failed",
            ErrorCode::SignatureFailed => "Message signing failed",
            ErrorCode::UnsupportedChain => "Unsupported blockchain network",
            ErrorCode::Timeout => "Connection request timed out",
            ErrorCode::WalletUnavailable => "Selected wallet is not available",
            ErrorCode::ConnectionFailed => "Failed to connect to wallet",
            ErrorCode::UnknownError => "An unknown error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment mode; controls receiver-side origin enforcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    #[default]
    Development,
    Production,
}

/// Kind of wallet connection method offered by the connector library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Injected,
    External,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_code_wire_names_match_serde() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let messages: HashSet<_> = ErrorCode::ALL.iter().map(|c| c.user_message()).collect();
        assert_eq!(messages.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn test_terminal_steps() {
        assert!(AuthStep::Success.is_terminal());
        assert!(AuthStep::Error.is_terminal());
        assert!(!AuthStep::Signing.is_terminal());
    }

    #[test]
    fn test_deployment_parses_lowercase() {
        let mode: Deployment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(mode, Deployment::Production);
        assert_eq!(Deployment::default(), Deployment::Development);
    }
}
