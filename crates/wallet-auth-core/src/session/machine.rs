/*
[INPUT]:  Wallet connector, host capabilities, environment detector, config
[OUTPUT]: Driven authentication session and exactly one delivered result per outcome
[POS]:    Session layer - orchestrates connect -> sign -> deliver -> reset
[UPDATE]: When session flow, auto-connect polling or delivery timing changes
*/

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{AuthSession, SessionEvent};
use crate::challenge::Challenge;
use crate::classifier::{FailurePhase, classify_failure};
use crate::config::{BridgeConfig, SessionTimings};
use crate::connector::{WalletAccount, WalletConnector, find_injected};
use crate::environment::{Environment, EnvironmentDetector, UserAgentDetector};
use crate::error::{ConnectorError, Result};
use crate::host::{DurableStorage, HostWindow};
use crate::return_url::ReturnUrlResolver;
use crate::transport::TransportDispatcher;
use crate::types::{AuthFailure, AuthPayload, AuthStep, ErrorCode};

/// How an injected-provider poll ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Provider appeared; a connect attempt was made with this connector
    Found(String),
    /// Bound exhausted; the session moved to Error
    Exhausted,
    /// Torn down before a provider appeared
    Cancelled,
    /// Not applicable: not a webview, already connected, or not selecting
    Skipped,
}

/// Drives a single authentication session.
///
/// All methods take `&mut self`; the page's event loop serialises every
/// callback, so there is never more than one transition in flight.
pub struct AuthSessionMachine {
    session: AuthSession,
    connector: Arc<dyn WalletConnector>,
    detector: Arc<dyn EnvironmentDetector>,
    dispatcher: TransportDispatcher,
    app_name: String,
    timings: SessionTimings,
    environment: Option<Environment>,
    shutdown: CancellationToken,
    polling: bool,
    last_result: Option<AuthPayload>,
}

impl AuthSessionMachine {
    /// Create a machine using user-agent based environment detection
    pub fn new(
        config: &BridgeConfig,
        connector: Arc<dyn WalletConnector>,
        host: Arc<dyn HostWindow>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let detector = Arc::new(UserAgentDetector::new(host.clone()));
        Self::with_detector(config, connector, host, storage, detector)
    }

    /// Create a machine with an explicit detector.
    ///
    /// Captures a query-supplied return URL into storage, as page load does.
    pub fn with_detector(
        config: &BridgeConfig,
        connector: Arc<dyn WalletConnector>,
        host: Arc<dyn HostWindow>,
        storage: Arc<dyn DurableStorage>,
        detector: Arc<dyn EnvironmentDetector>,
    ) -> Self {
        let return_urls =
            ReturnUrlResolver::new(host.clone(), storage, config.return_url_storage_key.clone())
                .with_app_scheme(config.app_scheme.clone());
        return_urls.capture();

        let dispatcher =
            TransportDispatcher::new(host, detector.clone(), return_urls, config.origin_policy());

        Self {
            session: AuthSession::new(),
            connector,
            detector,
            dispatcher,
            app_name: config.app_name.clone(),
            timings: config.timings(),
            environment: None,
            shutdown: CancellationToken::new(),
            polling: false,
            last_result: None,
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn step(&self) -> AuthStep {
        self.session.step()
    }

    /// Last result handed to the dispatcher
    pub fn last_result(&self) -> Option<&AuthPayload> {
        self.last_result.as_ref()
    }

    /// Whether the injected-provider poll timer is running
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Token that tears the session down (cancels the provider poll)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn teardown(&self) {
        self.shutdown.cancel();
    }

    /// Environment for this session; detected once, then reused
    pub fn environment(&mut self) -> Environment {
        if let Some(environment) = self.environment {
            return environment;
        }
        let environment = self.detector.detect();
        if environment.can_act() {
            self.environment = Some(environment);
        }
        environment
    }

    /// Page-load entry point: auto-connect inside wallet webviews
    pub async fn start(&mut self) -> PollOutcome {
        let environment = self.environment();
        if !environment.can_act() {
            debug!(session_id = %self.session.id(), "no window yet; waiting");
            return PollOutcome::Skipped;
        }

        info!(
            session_id = %self.session.id(),
            context = ?environment.context(),
            "auth session started"
        );

        if environment.is_web_view_like() {
            self.auto_connect().await
        } else {
            PollOutcome::Skipped
        }
    }

    /// Poll for an injected provider and connect as soon as one is ready
    pub async fn auto_connect(&mut self) -> PollOutcome {
        if self.connector.is_connected() || self.session.step() != AuthStep::Selecting {
            return PollOutcome::Skipped;
        }

        self.polling = true;
        let found = self.poll_injected().await;
        self.polling = false;

        match found {
            Some(Some(connector_id)) => {
                self.select_wallet(&connector_id).await;
                PollOutcome::Found(connector_id)
            }
            Some(None) => {
                warn!(
                    session_id = %self.session.id(),
                    attempts = self.timings.poll_max_attempts,
                    "no injected provider appeared"
                );
                self.fail(AuthFailure::from_code(ErrorCode::WalletUnavailable));
                PollOutcome::Exhausted
            }
            None => {
                debug!(session_id = %self.session.id(), "provider poll cancelled");
                PollOutcome::Cancelled
            }
        }
    }

    // Outer None: cancelled. Inner None: bound exhausted.
    async fn poll_injected(&self) -> Option<Option<String>> {
        let shutdown = self.shutdown.clone();
        for attempt in 1..=self.timings.poll_max_attempts {
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(self.timings.poll_interval) => {}
            }

            let connectors = self.connector.connectors();
            if let Some(injected) = find_injected(&connectors) {
                debug!(attempt, connector = %injected.id, "injected provider found");
                return Some(Some(injected.id.clone()));
            }
            debug!(attempt, "injected provider not ready");
        }
        Some(None)
    }

    /// User (or auto-connect) picked a wallet
    pub async fn select_wallet(&mut self, connector_id: &str) {
        if self.session.is_connecting() {
            debug!(connector = connector_id, "connect already in flight; ignored");
            return;
        }

        let known = self
            .connector
            .connectors()
            .iter()
            .any(|c| c.id == connector_id);
        if !known {
            warn!(connector = connector_id, "wallet provider not found");
            self.fail(AuthFailure::from_code(ErrorCode::WalletUnavailable));
            return;
        }

        if let Err(err) = self
            .session
            .apply(SessionEvent::SelectWallet(connector_id.to_string()))
        {
            warn!(error = %err, "wallet selection rejected");
            return;
        }
        info!(session_id = %self.session.id(), wallet = connector_id, "connecting");

        match self.connector.connect(connector_id).await {
            Ok(()) => {
                if self.session.step() != AuthStep::Connecting {
                    return;
                }
                let _ = self.session.apply(SessionEvent::ConnectionEstablished);
                self.on_connected().await;
            }
            Err(err) => self.fail_with(&err, FailurePhase::Connect),
        }
    }

    /// The connector reports a live connection.
    ///
    /// May fire any number of times; the sign flow runs at most once per
    /// connection because `BeginSign` is only accepted while unlatched.
    pub async fn on_connected(&mut self) {
        let Some(account) = self.connector.account() else {
            return;
        };
        if !self.session.can_apply(&SessionEvent::BeginSign) {
            debug!(step = ?self.session.step(), "sign already attempted; ignored");
            return;
        }
        if self.session.apply(SessionEvent::BeginSign).is_ok() {
            self.sign(account).await;
        }
    }

    /// The wallet connection dropped: back to selection, nothing emitted
    pub fn on_disconnected(&mut self) {
        if self.session.step() == AuthStep::Selecting {
            return;
        }
        let _ = self.session.apply(SessionEvent::Disconnected);
        info!(session_id = %self.session.id(), "wallet disconnected; session reset");
    }

    /// "Try Again" from the error step
    pub async fn retry(&mut self) -> Result<()> {
        self.session.apply(SessionEvent::Retry)?;
        self.connector.disconnect().await;
        info!(session_id = %self.session.id(), "retrying");
        Ok(())
    }

    async fn sign(&mut self, account: WalletAccount) {
        let challenge = Challenge::issue(&account.address, account.chain_id, &self.app_name);
        debug!(session_id = %self.session.id(), nonce = %challenge.nonce, "requesting signature");

        let signature = match self.connector.sign_message(&challenge.message).await {
            Ok(signature) if !signature.is_empty() => signature,
            Ok(_) => {
                self.fail_with(&ConnectorError::new("empty signature"), FailurePhase::Sign);
                return;
            }
            Err(err) => {
                self.fail_with(&err, FailurePhase::Sign);
                return;
            }
        };

        if self.connection_lost(&account) {
            return;
        }
        if let Err(err) = self.session.apply(SessionEvent::SignSucceeded) {
            warn!(error = %err, "signature arrived after session reset");
            return;
        }

        let wallet_type = self
            .session
            .selected_wallet_id()
            .unwrap_or_default()
            .to_string();
        let payload = AuthPayload::success(
            account.address.clone(),
            signature,
            challenge.message,
            account.chain_id,
            wallet_type,
            Utc::now().timestamp_millis(),
        );
        info!(session_id = %self.session.id(), "signature obtained");

        // leave the success screen up before the window closes or navigates
        tokio::time::sleep(self.timings.success_delay).await;
        if self.connection_lost(&account) {
            return;
        }
        self.deliver(payload);
    }

    /// The account that signed is no longer the live one: reset, emit nothing
    fn connection_lost(&mut self, signer: &WalletAccount) -> bool {
        if self.connector.account().as_ref() == Some(signer) {
            return false;
        }
        warn!(session_id = %self.session.id(), "wallet connection changed during signing; result dropped");
        self.on_disconnected();
        true
    }

    fn fail_with(&mut self, err: &ConnectorError, phase: FailurePhase) {
        let failure = classify_failure(err, phase);
        warn!(
            session_id = %self.session.id(),
            ?phase,
            code = %failure.code,
            error = %err,
            "auth step failed"
        );
        self.fail(failure);
    }

    fn fail(&mut self, failure: AuthFailure) {
        if let Err(err) = self.session.apply(SessionEvent::Fail(failure.clone())) {
            warn!(error = %err, "failure ignored");
            return;
        }
        self.deliver(AuthPayload::failure(failure));
    }

    fn deliver(&mut self, payload: AuthPayload) -> bool {
        if !self.session.claim_delivery() {
            warn!(session_id = %self.session.id(), "result already delivered");
            return false;
        }
        let attempted = self.dispatcher.deliver(&payload);
        if !attempted {
            debug!(session_id = %self.session.id(), "result kept in page");
        }
        self.last_result = Some(payload);
        attempted
    }
}
