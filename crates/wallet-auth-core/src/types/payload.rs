/*
[INPUT]:  Terminal session outcomes and raw host messages
[OUTPUT]: Wire payloads (`WALLET_AUTH_*`) with serialization support
[POS]:    Data layer - the structured messages exchanged with hosts
[UPDATE]: When the host message schema changes
*/

use serde::{Deserialize, Serialize};

use super::enums::ErrorCode;
use crate::error::{BridgeError, Result};

pub const SUCCESS_TYPE: &str = "WALLET_AUTH_SUCCESS";
pub const ERROR_TYPE: &str = "WALLET_AUTH_ERROR";
pub const INIT_TYPE: &str = "WALLET_AUTH_INIT";

/// Signed proof of wallet ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSuccess {
    pub address: String,
    pub signature: String,
    pub message: String,
    pub chain_id: u64,
    pub wallet_type: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

/// Classified failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl AuthFailure {
    /// Failure carrying the fixed message for `code`
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.user_message().to_string(),
        }
    }
}

/// Result handed to the host, exactly as it goes over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthPayload {
    #[serde(rename = "WALLET_AUTH_SUCCESS")]
    Success { data: AuthSuccess },
    #[serde(rename = "WALLET_AUTH_ERROR")]
    Error { error: AuthFailure },
}

impl AuthPayload {
    pub fn success(
        address: impl Into<String>,
        signature: impl Into<String>,
        message: impl Into<String>,
        chain_id: u64,
        wallet_type: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        AuthPayload::Success {
            data: AuthSuccess {
                address: address.into(),
                signature: signature.into(),
                message: message.into(),
                chain_id,
                wallet_type: wallet_type.into(),
                timestamp,
            },
        }
    }

    pub fn failure(failure: AuthFailure) -> Self {
        AuthPayload::Error { error: failure }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthPayload::Success { .. })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AuthPayload::Success { .. } => SUCCESS_TYPE,
            AuthPayload::Error { .. } => ERROR_TYPE,
        }
    }

    /// Error code, if this is a failure payload
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            AuthPayload::Error { error } => Some(error.code),
            AuthPayload::Success { .. } => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Kind of message recognised on the receiving side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Init,
    Success,
    Error,
}

/// Loosely-typed message as received from another window.
///
/// Anything carrying a string `type` is accepted; `data`/`error` are kept
/// as raw JSON until the caller asks for a typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl AuthMessage {
    pub fn message_type(&self) -> Option<MessageType> {
        match self.kind.as_str() {
            INIT_TYPE => Some(MessageType::Init),
            SUCCESS_TYPE => Some(MessageType::Success),
            ERROR_TYPE => Some(MessageType::Error),
            _ => None,
        }
    }

    /// Convert a success/error message into a typed payload
    pub fn into_payload(self) -> Result<AuthPayload> {
        match self.message_type() {
            Some(MessageType::Success) | Some(MessageType::Error) => {
                let value = serde_json::to_value(&self)?;
                Ok(serde_json::from_value(value)?)
            }
            _ => Err(BridgeError::InvalidPayload(format!(
                "message type {} carries no auth result",
                self.kind
            ))),
        }
    }
}
