/*
[INPUT]:  Test scenario requirements
[OUTPUT]: Shared fixtures: user agents, hosts, connectors, machines
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for wallet-auth-core tests

use std::sync::Arc;

use wallet_auth_core::{
    AuthSessionMachine, BridgeConfig, ConnectorInfo, MemoryStorage, MockConnector, MockHost,
};

pub const DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// iOS in-app browser: WebKit without the Safari token
#[allow(dead_code)]
pub const IOS_IN_APP_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

#[allow(dead_code)]
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[allow(dead_code)]
/// Connectors the page offers before any injected provider shows up
pub fn default_connectors() -> Vec<ConnectorInfo> {
    vec![
        ConnectorInfo::injected("metaMask", "MetaMask", true),
        ConnectorInfo::injected("injected", "Injected", false),
    ]
}

/// Connector that connects as 0xABC on chain 1 and signs with 0xSIG
pub fn happy_connector() -> MockConnector {
    MockConnector::new(default_connectors())
        .with_account("0xABC", 1)
        .with_signature("0xSIG")
}

#[allow(dead_code)]
pub fn machine(
    host: Arc<MockHost>,
    connector: Arc<MockConnector>,
    storage: Arc<MemoryStorage>,
) -> AuthSessionMachine {
    AuthSessionMachine::new(&BridgeConfig::default(), connector, host, storage)
}
