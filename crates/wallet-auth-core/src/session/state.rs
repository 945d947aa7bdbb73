/*
[INPUT]:  AuthStep from types module, SessionEvent enum
[OUTPUT]: Validated session transitions and the one-shot sign latch
[POS]:    Session domain logic - state machine for one authentication attempt
[UPDATE]: When session steps or transition rules change
*/

use thiserror::Error;
use uuid::Uuid;

use crate::types::{AuthFailure, AuthStep};

/// Events that can trigger session transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User or auto-connect picked a connector
    SelectWallet(String),
    /// The connector reported a successful connect
    ConnectionEstablished,
    /// Claim the single sign attempt for this connection
    BeginSign,
    SignSucceeded,
    Fail(AuthFailure),
    /// Manual "Try Again" from the error step
    Retry,
    /// Underlying wallet connection dropped
    Disconnected,
}

/// Errors occurring during state transitions
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Invalid transition: {from:?} -> {event:?}")]
    InvalidTransition { from: AuthStep, event: SessionEvent },
}

/// One authentication attempt per page load
#[derive(Debug, Clone)]
pub struct AuthSession {
    id: Uuid,
    step: AuthStep,
    selected_wallet_id: Option<String>,
    has_signed: bool,
    is_connecting: bool,
    error: Option<AuthFailure>,
    result_delivered: bool,
}

impl AuthSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: AuthStep::Selecting,
            selected_wallet_id: None,
            has_signed: false,
            is_connecting: false,
            error: None,
            result_delivered: false,
        }
    }

    /// Check if the event is valid from the current step
    pub fn can_apply(&self, event: &SessionEvent) -> bool {
        match (self.step, event) {
            (AuthStep::Selecting, SessionEvent::SelectWallet(_)) => !self.is_connecting,
            (AuthStep::Connecting, SessionEvent::ConnectionEstablished) => true,
            (AuthStep::Connecting, SessionEvent::BeginSign) => !self.has_signed,
            (AuthStep::Signing, SessionEvent::SignSucceeded) => true,
            (AuthStep::Selecting | AuthStep::Connecting | AuthStep::Signing, SessionEvent::Fail(_)) => true,
            (AuthStep::Error, SessionEvent::Retry) => true,
            (_, SessionEvent::Disconnected) => true,
            _ => false,
        }
    }

    /// Perform a transition, returning the new step
    pub fn apply(&mut self, event: SessionEvent) -> Result<AuthStep, StateError> {
        if !self.can_apply(&event) {
            return Err(StateError::InvalidTransition {
                from: self.step,
                event,
            });
        }

        match event {
            SessionEvent::SelectWallet(wallet_id) => {
                self.step = AuthStep::Connecting;
                self.selected_wallet_id = Some(wallet_id);
                self.is_connecting = true;
                self.error = None;
            }
            SessionEvent::ConnectionEstablished => {
                self.is_connecting = false;
            }
            SessionEvent::BeginSign => {
                self.has_signed = true;
                self.is_connecting = false;
                self.step = AuthStep::Signing;
            }
            SessionEvent::SignSucceeded => {
                self.step = AuthStep::Success;
            }
            SessionEvent::Fail(failure) => {
                self.is_connecting = false;
                self.error = Some(failure);
                self.step = AuthStep::Error;
            }
            SessionEvent::Retry | SessionEvent::Disconnected => self.reset(),
        }

        Ok(self.step)
    }

    /// Latch delivery for the current terminal result; true only once
    pub fn claim_delivery(&mut self) -> bool {
        if !self.step.is_terminal() || self.result_delivered {
            return false;
        }
        self.result_delivered = true;
        true
    }

    fn reset(&mut self) {
        self.step = AuthStep::Selecting;
        self.selected_wallet_id = None;
        self.has_signed = false;
        self.is_connecting = false;
        self.error = None;
        self.result_delivered = false;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn selected_wallet_id(&self) -> Option<&str> {
        self.selected_wallet_id.as_deref()
    }

    pub fn has_signed(&self) -> bool {
        self.has_signed
    }

    pub fn is_connecting(&self) -> bool {
        self.is_connecting
    }

    pub fn error(&self) -> Option<&AuthFailure> {
        self.error.as_ref()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;

    fn failure() -> AuthFailure {
        AuthFailure::from_code(ErrorCode::ConnectionFailed)
    }

    #[test]
    fn test_initial_state() {
        let session = AuthSession::new();
        assert_eq!(session.step(), AuthStep::Selecting);
        assert!(session.selected_wallet_id().is_none());
        assert!(!session.has_signed());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_happy_path() {
        let mut session = AuthSession::new();
        assert_eq!(
            session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap(),
            AuthStep::Connecting
        );
        assert_eq!(session.selected_wallet_id(), Some("W"));
        assert!(session.is_connecting());

        assert_eq!(
            session.apply(SessionEvent::ConnectionEstablished).unwrap(),
            AuthStep::Connecting
        );
        assert!(!session.is_connecting());

        assert_eq!(session.apply(SessionEvent::BeginSign).unwrap(), AuthStep::Signing);
        assert!(session.has_signed());
        assert_eq!(session.apply(SessionEvent::SignSucceeded).unwrap(), AuthStep::Success);
    }

    #[test]
    fn test_sign_latch_is_one_shot() {
        let mut session = AuthSession::new();
        session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap();
        session.apply(SessionEvent::BeginSign).unwrap();
        assert!(!session.can_apply(&SessionEvent::BeginSign));
        assert!(session.apply(SessionEvent::BeginSign).is_err());
    }

    #[test]
    fn test_connect_failure_clears_connecting() {
        let mut session = AuthSession::new();
        session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap();
        session.apply(SessionEvent::Fail(failure())).unwrap();
        assert_eq!(session.step(), AuthStep::Error);
        assert!(!session.is_connecting());
        assert_eq!(session.error().map(|e| e.code), Some(ErrorCode::ConnectionFailed));
    }

    #[test]
    fn test_select_ignored_while_connecting() {
        let mut session = AuthSession::new();
        session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap();
        let result = session.apply(SessionEvent::SelectWallet("X".to_string()));
        assert!(result.is_err());
        assert_eq!(session.selected_wallet_id(), Some("W"));
    }

    #[test]
    fn test_retry_only_from_error() {
        let mut session = AuthSession::new();
        assert!(session.apply(SessionEvent::Retry).is_err());

        session.apply(SessionEvent::Fail(failure())).unwrap();
        assert_eq!(session.apply(SessionEvent::Retry).unwrap(), AuthStep::Selecting);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_disconnect_resets_from_any_step() {
        let mut session = AuthSession::new();
        session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap();
        session.apply(SessionEvent::BeginSign).unwrap();
        session.apply(SessionEvent::SignSucceeded).unwrap();
        assert!(session.claim_delivery());

        session.apply(SessionEvent::Disconnected).unwrap();
        assert_eq!(session.step(), AuthStep::Selecting);
        assert!(session.selected_wallet_id().is_none());
        assert!(!session.has_signed());
        assert!(!session.claim_delivery());
    }

    #[test]
    fn test_delivery_claimed_once_per_terminal_result() {
        let mut session = AuthSession::new();
        assert!(!session.claim_delivery());
        session.apply(SessionEvent::Fail(failure())).unwrap();
        assert!(session.claim_delivery());
        assert!(!session.claim_delivery());

        session.apply(SessionEvent::Retry).unwrap();
        session.apply(SessionEvent::Fail(failure())).unwrap();
        assert!(session.claim_delivery());
    }

    #[test]
    fn test_success_is_terminal() {
        let mut session = AuthSession::new();
        session.apply(SessionEvent::SelectWallet("W".to_string())).unwrap();
        session.apply(SessionEvent::BeginSign).unwrap();
        session.apply(SessionEvent::SignSucceeded).unwrap();

        let result = session.apply(SessionEvent::Fail(failure()));
        if let Err(StateError::InvalidTransition { from, event }) = result {
            assert_eq!(from, AuthStep::Success);
            assert_eq!(event, SessionEvent::Fail(failure()));
        } else {
            panic!("expected invalid transition");
        }
    }
}
