/*
[INPUT]:  Connector descriptors and injected provider flags
[OUTPUT]: Supported wallet list filtered to what the page can offer
[POS]:    Connector layer - wallet catalogue shown on the selection step
[UPDATE]: When adding supported wallets
*/

use super::{ConnectorInfo, INJECTED_CONNECTOR_ID};
use crate::types::ConnectorKind;

/// Wallet the selection step may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedWallet {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const SUPPORTED_WALLETS: &[SupportedWallet] = &[
    SupportedWallet {
        id: "metaMask",
        name: "MetaMask",
        description: "Connect using MetaMask browser extension or mobile app",
    },
    SupportedWallet {
        id: "coinbaseWallet",
        name: "Coinbase Wallet",
        description: "Connect using Coinbase Wallet",
    },
    SupportedWallet {
        id: INJECTED_CONNECTOR_ID,
        name: "Browser Wallet",
        description: "Connect using your browser wallet (e.g., Brave, Rainbow)",
    },
];

/// Brand flags set on an injected provider object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    pub is_meta_mask: bool,
    pub is_coinbase_wallet: bool,
    pub is_brave_wallet: bool,
    pub is_rainbow: bool,
}

/// Wallet type string for an injected provider; `None` when there is none
pub fn detect_wallet_type(provider: Option<&ProviderFlags>) -> Option<&'static str> {
    let flags = provider?;
    let wallet_type = if flags.is_meta_mask {
        "metaMask"
    } else if flags.is_coinbase_wallet {
        "coinbase"
    } else if flags.is_brave_wallet {
        "brave"
    } else if flags.is_rainbow {
        "rainbow"
    } else {
        INJECTED_CONNECTOR_ID
    };
    Some(wallet_type)
}

/// Supported wallets backed by a ready injected connector, deduplicated
pub fn available_wallets(connectors: &[ConnectorInfo]) -> Vec<&'static SupportedWallet> {
    SUPPORTED_WALLETS
        .iter()
        .filter(|wallet| {
            connectors
                .iter()
                .any(|c| c.id == wallet.id && c.kind == ConnectorKind::Injected && c.ready)
        })
        .collect()
}

/// Ready injected connector to auto-connect with; the generic one wins
pub fn find_injected(connectors: &[ConnectorInfo]) -> Option<&ConnectorInfo> {
    let mut ready = connectors
        .iter()
        .filter(|c| c.kind == ConnectorKind::Injected && c.ready);
    let first = ready.clone().next();
    ready.find(|c| c.id == INJECTED_CONNECTOR_ID).or(first)
}
