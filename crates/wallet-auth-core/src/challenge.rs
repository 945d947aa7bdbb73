/*
[INPUT]:  Wallet address, chain id, app display name, issuance time
[OUTPUT]: Fresh nonce and the human-readable challenge to sign
[POS]:    Challenge layer - binds a signature to address, nonce and chain
[UPDATE]: When the challenge wording or nonce size changes
*/

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

/// Nonce entropy in bytes (hex-encoded to twice as many characters)
pub const NONCE_BYTES: usize = 32;

/// 256-bit nonce from the OS CSPRNG, lowercase hex
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Render the challenge text.
///
/// Deterministic for identical inputs; address, nonce and chain id always
/// appear verbatim so the signature cannot be replayed elsewhere.
pub fn build_message(
    address: &str,
    nonce: &str,
    chain_id: u64,
    app_name: &str,
    issued_at: DateTime<Utc>,
) -> String {
    let issued_at = issued_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        "Sign in to {app_name}\n\n\
         Wallet: {address}\n\
         Nonce: {nonce}\n\
         Chain ID: {chain_id}\n\
         Issued At: {issued_at}\n\n\
         This request will not trigger any blockchain transaction or cost any gas fees."
    )
}

/// A single sign attempt's challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl Challenge {
    /// Issue a challenge with a fresh nonce, stamped now
    pub fn issue(address: &str, chain_id: u64, app_name: &str) -> Self {
        let nonce = generate_nonce();
        let issued_at = Utc::now();
        let message = build_message(address, &nonce, chain_id, app_name, issued_at);
        Self {
            nonce,
            message,
            issued_at,
        }
    }
}
