/*
[INPUT]:  Wallet-connector library capabilities (connect, sign, account)
[OUTPUT]: WalletConnector trait and connector descriptors
[POS]:    Connector layer - wallet integration abstraction
[UPDATE]: When adding new connector implementations or capabilities
*/

pub mod catalogue;
pub mod local_key;
pub mod mock;

pub use catalogue::{
    ProviderFlags, SUPPORTED_WALLETS, SupportedWallet, available_wallets, detect_wallet_type,
    find_injected,
};
pub use local_key::LocalKeyConnector;
pub use mock::MockConnector;

use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::types::ConnectorKind;

/// Connector id of the generic injected provider
pub const INJECTED_CONNECTOR_ID: &str = "injected";

/// One wallet-connection method offered by the connector library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
    pub kind: ConnectorKind,
    /// Provider object is available (injected providers appear late)
    pub ready: bool,
}

impl ConnectorInfo {
    pub fn injected(id: &str, name: &str, ready: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ConnectorKind::Injected,
            ready,
        }
    }
}

/// Connected account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: String,
    pub chain_id: u64,
}

/// Wallet connection and signing, as exposed by the connector library.
///
/// Implement this trait over whatever wallet stack the page uses. Calls
/// are async because both connect and sign wait for the user.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Connection methods currently known
    fn connectors(&self) -> Vec<ConnectorInfo>;

    /// Connected account, if any
    fn account(&self) -> Option<WalletAccount>;

    fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Connect through the connector with the given id
    async fn connect(&self, connector_id: &str) -> Result<(), ConnectorError>;

    /// Sign a text message with the connected account
    ///
    /// For EVM wallets: returns the hex-encoded signature (0x...)
    async fn sign_message(&self, message: &str) -> Result<String, ConnectorError>;

    async fn disconnect(&self);
}
