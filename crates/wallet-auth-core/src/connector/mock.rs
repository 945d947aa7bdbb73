/*
[INPUT]:  Scripted connector list, connect/sign outcomes
[OUTPUT]: Deterministic WalletConnector with call counters
[POS]:    Connector layer - test double for session tests and demos
[UPDATE]: When WalletConnector gains methods
*/

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ConnectorInfo, WalletAccount, WalletConnector};
use crate::error::ConnectorError;

#[derive(Debug)]
struct LateProvider {
    connector_id: String,
    after_calls: usize,
}

/// Mock wallet connector for testing
#[derive(Debug)]
pub struct MockConnector {
    connectors: Mutex<Vec<ConnectorInfo>>,
    late_provider: Mutex<Option<LateProvider>>,
    account_on_connect: Option<WalletAccount>,
    account: Mutex<Option<WalletAccount>>,
    connect_result: Result<(), ConnectorError>,
    sign_result: Result<String, ConnectorError>,
    drop_after_sign: Option<Duration>,
    dropped_at: Mutex<Option<Instant>>,
    connectors_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    signed_messages: Mutex<Vec<String>>,
}

impl MockConnector {
    /// Create a mock offering the given connectors; connect and sign succeed
    pub fn new(connectors: Vec<ConnectorInfo>) -> Self {
        Self {
            connectors: Mutex::new(connectors),
            late_provider: Mutex::new(None),
            account_on_connect: None,
            account: Mutex::new(None),
            connect_result: Ok(()),
            sign_result: Ok("0xmock_signature".to_string()),
            drop_after_sign: None,
            dropped_at: Mutex::new(None),
            connectors_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            signed_messages: Mutex::new(Vec::new()),
        }
    }

    /// Account that becomes connected when `connect` succeeds
    pub fn with_account(mut self, address: &str, chain_id: u64) -> Self {
        self.account_on_connect = Some(WalletAccount {
            address: address.to_string(),
            chain_id,
        });
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.sign_result = Ok(signature.to_string());
        self
    }

    pub fn failing_connect(mut self, message: &str) -> Self {
        self.connect_result = Err(ConnectorError::new(message));
        self
    }

    pub fn failing_sign(mut self, message: &str) -> Self {
        self.sign_result = Err(ConnectorError::new(message));
        self
    }

    /// Lose the connection `delay` after a signature request starts
    pub fn disconnect_after_sign(mut self, delay: Duration) -> Self {
        self.drop_after_sign = Some(delay);
        self
    }

    /// Mark `connector_id` ready once `connectors()` has been called `after_calls` times
    pub fn inject_provider_after(self, connector_id: &str, after_calls: usize) -> Self {
        *self.late_provider.lock().expect("late provider lock") = Some(LateProvider {
            connector_id: connector_id.to_string(),
            after_calls,
        });
        self
    }

    /// Simulate the connection appearing or dropping outside of `connect`
    pub fn set_account(&self, account: Option<WalletAccount>) {
        *self.account.lock().expect("account lock") = account;
    }

    pub fn connectors_calls(&self) -> usize {
        self.connectors_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn signed_messages(&self) -> Vec<String> {
        self.signed_messages.lock().expect("signed messages lock").clone()
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        let calls = self.connectors_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut connectors = self.connectors.lock().expect("connectors lock");

        if let Some(late) = self.late_provider.lock().expect("late provider lock").as_ref()
            && calls >= late.after_calls
        {
            for connector in connectors.iter_mut().filter(|c| c.id == late.connector_id) {
                connector.ready = true;
            }
        }

        connectors.clone()
    }

    fn account(&self) -> Option<WalletAccount> {
        let mut dropped_at = self.dropped_at.lock().expect("dropped at lock");
        if let Some(at) = *dropped_at
            && Instant::now() >= at
        {
            *dropped_at = None;
            self.set_account(None);
        }
        self.account.lock().expect("account lock").clone()
    }

    async fn connect(&self, _connector_id: &str) -> Result<(), ConnectorError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_result.clone()?;
        if let Some(account) = &self.account_on_connect {
            self.set_account(Some(account.clone()));
        }
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, ConnectorError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.signed_messages
            .lock()
            .expect("signed messages lock")
            .push(message.to_string());
        if let Some(delay) = self.drop_after_sign {
            *self.dropped_at.lock().expect("dropped at lock") = Some(Instant::now() + delay);
        }
        self.sign_result.clone()
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.set_account(None);
    }
}
