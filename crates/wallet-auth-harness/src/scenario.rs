/*
[INPUT]:  Scenario choice, bridge config, wallet connector
[OUTPUT]: Report of one simulated auth session and what reached the host
[POS]:    Harness core - drives AuthSessionMachine against a recording host
[UPDATE]: When adding scenarios or report fields
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wallet_auth_core::connector::{INJECTED_CONNECTOR_ID, available_wallets};
use wallet_auth_core::host::HostCall;
use wallet_auth_core::{
    AuthPayload, AuthSessionMachine, AuthStep, BridgeConfig, ConnectorInfo, LocalKeyConnector,
    MemoryStorage, MockConnector, MockHost, PollOutcome, RuntimeInfo, WalletConnector, WindowRef,
};

const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IOS_WALLET_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 MetaMaskMobile/7.10.0";

/// Return URL used by the redirect scenario when none is given
pub const DEFAULT_RETURN_URL: &str = "myapp://wallet-auth";

const SIMULATED_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
const SIMULATED_SIGNATURE: &str = "0xsimulated_signature";

/// Page context to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Desktop browser tab with no host
    Plain,
    /// Window opened by the host page
    Popup,
    /// Iframe embedded in the host page
    Frame,
    /// Wallet webview exposing a native bridge
    Native,
    /// Wallet in-app browser, provider injected late
    InApp,
    /// Desktop tab handing back through a return URL
    Redirect,
}

impl Scenario {
    pub fn runtime(self) -> RuntimeInfo {
        match self {
            Scenario::Plain | Scenario::Redirect => RuntimeInfo::top_level(DESKTOP_UA),
            Scenario::Popup => RuntimeInfo::top_level(DESKTOP_UA).with_opener(WindowRef::Other),
            Scenario::Frame => RuntimeInfo::top_level(DESKTOP_UA).with_parent(WindowRef::Other),
            Scenario::Native => RuntimeInfo::top_level(IOS_WALLET_UA).with_native_bridge(),
            Scenario::InApp => RuntimeInfo::top_level(IOS_WALLET_UA),
        }
    }

    /// Wallet webviews auto-connect; everything else picks a wallet by hand
    pub fn is_wallet_webview(self) -> bool {
        matches!(self, Scenario::Native | Scenario::InApp)
    }

    pub fn connector_id(self) -> &'static str {
        if self.is_wallet_webview() {
            INJECTED_CONNECTOR_ID
        } else {
            "metaMask"
        }
    }
}

/// Inputs of one simulated run
#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    pub scenario: Scenario,
    pub return_url: Option<String>,
    pub private_key: Option<String>,
    pub chain_id: u64,
    /// Make the wallet fail to connect with this error text
    pub fail_connect: Option<String>,
    /// Make the wallet fail to sign with this error text
    pub fail_sign: Option<String>,
}

impl ScenarioOptions {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            return_url: None,
            private_key: None,
            chain_id: 1,
            fail_connect: None,
            fail_sign: None,
        }
    }

    fn effective_return_url(&self) -> Option<String> {
        match (&self.return_url, self.scenario) {
            (Some(url), _) => Some(url.clone()),
            (None, Scenario::Redirect) => Some(DEFAULT_RETURN_URL.to_string()),
            (None, _) => None,
        }
    }

    fn connector(&self) -> Result<Arc<dyn WalletConnector>> {
        let connector_id = self.scenario.connector_id();
        if let Some(key) = &self.private_key {
            let connector = LocalKeyConnector::new(key, self.chain_id)
                .context("create local key connector")?
                .with_connector_id(connector_id);
            return Ok(Arc::new(connector));
        }

        // the injected provider shows up on the third poll in webviews
        let webview = self.scenario.is_wallet_webview();
        let connectors = if webview {
            vec![ConnectorInfo::injected(INJECTED_CONNECTOR_ID, "Browser Wallet", false)]
        } else {
            vec![
                ConnectorInfo::injected("metaMask", "MetaMask", true),
                ConnectorInfo::injected(INJECTED_CONNECTOR_ID, "Browser Wallet", true),
            ]
        };
        let mut connector = MockConnector::new(connectors)
            .with_account(SIMULATED_ADDRESS, self.chain_id)
            .with_signature(SIMULATED_SIGNATURE);
        if webview {
            connector = connector.inject_provider_after(INJECTED_CONNECTOR_ID, 3);
        }
        if let Some(message) = &self.fail_connect {
            connector = connector.failing_connect(message);
        }
        if let Some(message) = &self.fail_sign {
            connector = connector.failing_sign(message);
        }
        Ok(Arc::new(connector))
    }
}

/// One side effect the page performed on its host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum DeliveryRecord {
    NativeBridge { text: String },
    PostMessage {
        target: String,
        target_origin: String,
        message: serde_json::Value,
    },
    Navigate { url: String },
    Close,
}

impl From<HostCall> for DeliveryRecord {
    fn from(call: HostCall) -> Self {
        match call {
            HostCall::NativeBridge(text) => DeliveryRecord::NativeBridge { text },
            HostCall::PostMessage {
                target,
                message,
                target_origin,
            } => DeliveryRecord::PostMessage {
                target: format!("{target:?}").to_lowercase(),
                target_origin,
                message,
            },
            HostCall::Navigate(url) => DeliveryRecord::Navigate { url },
            HostCall::Close => DeliveryRecord::Close,
        }
    }
}

/// What a simulated session ended with
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub session_id: String,
    pub final_step: AuthStep,
    pub auto_connect: String,
    /// Supported wallets the selection step could show at the end of the run
    pub offered_wallets: Vec<String>,
    pub result: Option<AuthPayload>,
    pub deliveries: Vec<DeliveryRecord>,
}

/// Run a single session to completion against a recording host
pub async fn run_scenario(
    config: &BridgeConfig,
    options: &ScenarioOptions,
    shutdown: CancellationToken,
) -> Result<ScenarioReport> {
    let mut host = MockHost::new(options.scenario.runtime());
    if let Some(url) = options.effective_return_url() {
        host = host.with_query("returnUrl", &url);
    }
    let host = Arc::new(host);
    let connector = options.connector()?;

    let mut machine = AuthSessionMachine::new(
        config,
        connector.clone(),
        host.clone(),
        Arc::new(MemoryStorage::new()),
    );

    let session_token = machine.shutdown_token();
    let forward = tokio::spawn(async move {
        shutdown.cancelled().await;
        session_token.cancel();
    });

    info!(scenario = ?options.scenario, session_id = %machine.session().id(), "simulating session");
    let outcome = machine.start().await;
    if outcome == PollOutcome::Skipped && machine.step() == AuthStep::Selecting {
        machine.select_wallet(options.scenario.connector_id()).await;
    }
    forward.abort();

    Ok(ScenarioReport {
        scenario: options.scenario,
        session_id: machine.session().id().to_string(),
        final_step: machine.step(),
        auto_connect: format!("{outcome:?}"),
        offered_wallets: available_wallets(&connector.connectors())
            .iter()
            .map(|wallet| wallet.id.to_string())
            .collect(),
        result: machine.last_result().cloned(),
        deliveries: host.calls().into_iter().map(DeliveryRecord::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> BridgeConfig {
        BridgeConfig {
            poll_interval_ms: 10,
            success_delay_ms: 0,
            ..BridgeConfig::default()
        }
    }

    async fn run(options: ScenarioOptions) -> ScenarioReport {
        tokio_test::assert_ok!(run_scenario(&fast_config(), &options, CancellationToken::new()).await)
    }

    #[tokio::test]
    async fn test_popup_posts_and_closes() {
        let report = run(ScenarioOptions::new(Scenario::Popup)).await;
        assert_eq!(report.final_step, AuthStep::Success);
        assert_eq!(report.deliveries.len(), 2);
        assert_eq!(report.deliveries[1], DeliveryRecord::Close);
        assert_eq!(report.offered_wallets, vec!["metaMask", "injected"]);
    }

    #[tokio::test]
    async fn test_in_app_polls_then_signs() {
        let report = run(ScenarioOptions::new(Scenario::InApp)).await;
        assert_eq!(report.auto_connect, "Found(\"injected\")");
        assert_eq!(report.final_step, AuthStep::Success);
        // no opener, frame or return url: the result stays in the page
        assert!(report.deliveries.is_empty());
        assert!(report.result.is_some());
    }

    #[tokio::test]
    async fn test_native_bridge_delivery() {
        let report = run(ScenarioOptions::new(Scenario::Native)).await;
        assert!(matches!(
            report.deliveries.as_slice(),
            [DeliveryRecord::NativeBridge { .. }]
        ));
    }

    #[tokio::test]
    async fn test_redirect_defaults_return_url() {
        let report = run(ScenarioOptions::new(Scenario::Redirect)).await;
        match report.deliveries.as_slice() {
            [DeliveryRecord::Navigate { url }] => {
                assert!(url.starts_with("myapp://wallet-auth?result="))
            }
            other => panic!("unexpected deliveries: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_failure_reported() {
        let mut options = ScenarioOptions::new(Scenario::Frame);
        options.fail_connect = Some("User rejected the request.".to_string());
        let report = run(options).await;
        assert_eq!(report.final_step, AuthStep::Error);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deliveries"][0]["channel"], "post_message");
        assert_eq!(json["deliveries"][0]["target"], "parent");
        assert_eq!(json["deliveries"][0]["message"]["error"]["code"], "USER_REJECTED");
    }

    #[tokio::test]
    async fn test_popup_error_keeps_window_open() {
        let mut options = ScenarioOptions::new(Scenario::Popup);
        options.fail_connect = Some("User rejected the request.".to_string());
        let report = run(options).await;
        assert_eq!(report.final_step, AuthStep::Error);
        assert_eq!(report.deliveries.len(), 1);
        assert!(!report.deliveries.contains(&DeliveryRecord::Close));
    }

    #[tokio::test]
    async fn test_local_key_scenario() {
        let mut options = ScenarioOptions::new(Scenario::Popup);
        options.private_key =
            Some("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string());
        let report = run(options).await;
        match report.result {
            Some(AuthPayload::Success { data }) => {
                assert_eq!(data.address, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_private_key() {
        let mut options = ScenarioOptions::new(Scenario::Popup);
        options.private_key = Some("not-a-key".to_string());
        assert!(options.connector().is_err());
    }
}
