/*
[INPUT]:  EVM private key (hex string) and chain id
[OUTPUT]: WalletConnector that signs EIP-191 personal messages in-process
[POS]:    Connector layer - local EVM wallet for demos and end-to-end runs
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use super::{ConnectorInfo, INJECTED_CONNECTOR_ID, WalletAccount, WalletConnector};
use crate::error::{BridgeError, ConnectorError, Result};

/// Connector backed by a private key held in memory
pub struct LocalKeyConnector {
    signer: PrivateKeySigner,
    address: String,
    chain_id: u64,
    connector_id: String,
    connected: AtomicBool,
}

impl LocalKeyConnector {
    /// Create a connector from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str, chain_id: u64) -> Result<Self> {
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| BridgeError::Config(format!("Invalid EVM private key: {e}")))?;

        let address = signer.address().to_checksum(None);

        Ok(Self {
            signer,
            address,
            chain_id,
            connector_id: INJECTED_CONNECTOR_ID.to_string(),
            connected: AtomicBool::new(false),
        })
    }

    /// Advertise under a different connector id (e.g. "metaMask")
    pub fn with_connector_id(mut self, connector_id: &str) -> Self {
        self.connector_id = connector_id.to_string();
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl WalletConnector for LocalKeyConnector {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        vec![ConnectorInfo::injected(&self.connector_id, "Local Key", true)]
    }

    fn account(&self) -> Option<WalletAccount> {
        self.connected.load(Ordering::SeqCst).then(|| WalletAccount {
            address: self.address.clone(),
            chain_id: self.chain_id,
        })
    }

    async fn connect(&self, connector_id: &str) -> std::result::Result<(), ConnectorError> {
        if connector_id != self.connector_id {
            return Err(ConnectorError::new(format!(
                "Connector not found: {connector_id}"
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> std::result::Result<String, ConnectorError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ConnectorError::new("Connector not connected"));
        }
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| ConnectorError::new(format!("Failed to sign EVM message: {e}")))?;

        // alloy's Signature as_bytes() returns [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A well-known test private key
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_local_key_connector_signs_after_connect() {
        let connector = LocalKeyConnector::new(TEST_KEY, 1).unwrap();
        assert_eq!(connector.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert!(connector.account().is_none());
        assert!(connector.sign_message("hello").await.is_err());

        connector.connect("injected").await.unwrap();
        let account = connector.account().unwrap();
        assert_eq!(account.chain_id, 1);

        let signature = connector.sign_message("hello").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132); // 0x + 65 bytes * 2 = 132

        connector.disconnect().await;
        assert!(!connector.is_connected());
    }

    #[tokio::test]
    async fn test_unknown_connector_id() {
        let connector = LocalKeyConnector::new(TEST_KEY, 1)
            .unwrap()
            .with_connector_id("metaMask");
        let err = connector.connect("injected").await.unwrap_err();
        assert!(err.message.contains("Connector not found"));
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            LocalKeyConnector::new("not-hex", 1),
            Err(BridgeError::Config(_))
        ));
    }
}
