/*
[INPUT]:  Raw connector/signing failure text and the phase it happened in
[OUTPUT]: ErrorCode plus its fixed user-facing message
[POS]:    Error classification - collapses every failure into the closed vocabulary
[UPDATE]: When wallet libraries change their error wording
*/

use crate::error::ConnectorError;
use crate::types::{AuthFailure, ErrorCode};

/// Phase a failure happened in; selects the fallback code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    Connect,
    Sign,
    Other,
}

impl FailurePhase {
    pub fn default_code(self) -> ErrorCode {
        match self {
            FailurePhase::Connect => ErrorCode::ConnectionFailed,
            FailurePhase::Sign => ErrorCode::SignatureFailed,
            FailurePhase::Other => ErrorCode::UnknownError,
        }
    }
}

// Checked in order; first match wins. Patterns are lowercase.
const RULES: &[(ErrorCode, &[&str])] = &[
    (
        ErrorCode::UserRejected,
        &[
            "user rejected",
            "user denied",
            "rejected the request",
            "user cancelled",
            "user canceled",
        ],
    ),
    (
        ErrorCode::WalletNotDetected,
        &["no wallet", "provider not found", "no ethereum provider", "not installed"],
    ),
    (
        ErrorCode::WalletLocked,
        &["wallet is locked", "wallet locked", "is locked", "unlock"],
    ),
    (
        ErrorCode::UnsupportedChain,
        &[
            "unsupported chain",
            "chain not configured",
            "unrecognized chain",
            "chain mismatch",
            "unsupported network",
        ],
    ),
    (ErrorCode::Timeout, &["timed out", "timeout"]),
    (
        ErrorCode::NetworkError,
        &["network", "failed to fetch", "connection refused"],
    ),
    (
        ErrorCode::WalletUnavailable,
        &["connector not found", "not available", "unavailable"],
    ),
];

/// Map a raw failure message to an error code
pub fn classify(raw: &str, phase: FailurePhase) -> ErrorCode {
    let lowered = raw.to_lowercase();
    RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(code, _)| *code)
        .unwrap_or_else(|| phase.default_code())
}

/// Classify a connector error into a user-facing failure
pub fn classify_failure(err: &ConnectorError, phase: FailurePhase) -> AuthFailure {
    AuthFailure::from_code(classify(&err.message, phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("User rejected the request.", FailurePhase::Connect, ErrorCode::UserRejected)]
    #[case("MetaMask Tx Signature: User denied message signature.", FailurePhase::Sign, ErrorCode::UserRejected)]
    #[case("No wallet found", FailurePhase::Connect, ErrorCode::WalletNotDetected)]
    #[case("Provider not found.", FailurePhase::Connect, ErrorCode::WalletNotDetected)]
    #[case("Wallet is locked", FailurePhase::Connect, ErrorCode::WalletLocked)]
    #[case("Please unlock MetaMask", FailurePhase::Connect, ErrorCode::WalletLocked)]
    #[case("Popup blocked by the browser", FailurePhase::Connect, ErrorCode::ConnectionFailed)]
    #[case("Request blocked", FailurePhase::Sign, ErrorCode::SignatureFailed)]
    #[case("Chain not configured.", FailurePhase::Sign, ErrorCode::UnsupportedChain)]
    #[case("Request timed out", FailurePhase::Connect, ErrorCode::Timeout)]
    #[case("Network request failed", FailurePhase::Connect, ErrorCode::NetworkError)]
    #[case("Connector not found", FailurePhase::Connect, ErrorCode::WalletUnavailable)]
    #[case("something odd", FailurePhase::Connect, ErrorCode::ConnectionFailed)]
    #[case("something odd", FailurePhase::Sign, ErrorCode::SignatureFailed)]
    #[case("", FailurePhase::Other, ErrorCode::UnknownError)]
    fn test_classify(#[case] raw: &str, #[case] phase: FailurePhase, #[case] expected: ErrorCode) {
        assert_eq!(classify(raw, phase), expected);
    }

    #[test]
    fn test_rejection_beats_later_rules() {
        // mentions the network, but the user still said no
        let code = classify("User rejected network switch", FailurePhase::Connect);
        assert_eq!(code, ErrorCode::UserRejected);
    }

    #[test]
    fn test_classify_failure_uses_fixed_message() {
        let failure = classify_failure(&ConnectorError::new("USER REJECTED"), FailurePhase::Sign);
        assert_eq!(failure.code, ErrorCode::UserRejected);
        assert_eq!(failure.message, ErrorCode::UserRejected.user_message());
    }
}
