/*
[INPUT]:  Raw cross-window message events (origin + data)
[OUTPUT]: Validated AuthMessage values for the host side
[POS]:    Host-side helper - filters what the host page listens to
[UPDATE]: When origin validation or accepted message shapes change
*/

use serde_json::Value;
use tracing::{debug, warn};

use crate::origin::OriginPolicy;
use crate::types::{AuthMessage, Deployment};

/// Accepts auth messages posted by the auth page.
///
/// Origins are only enforced in production deployments; development
/// accepts anything so local hosts on random ports keep working.
#[derive(Debug, Clone)]
pub struct MessageReceiver {
    origins: OriginPolicy,
    deployment: Deployment,
}

impl MessageReceiver {
    pub fn new(origins: OriginPolicy, deployment: Deployment) -> Self {
        Self {
            origins,
            deployment,
        }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        match self.deployment {
            Deployment::Development => true,
            Deployment::Production => self.origins.is_wildcard() || self.origins.is_allowed(origin),
        }
    }

    /// Validate and decode one message event; anything unusable is dropped
    pub fn accept(&self, origin: &str, data: &Value) -> Option<AuthMessage> {
        if !self.origin_allowed(origin) {
            warn!(origin, "message from disallowed origin dropped");
            return None;
        }

        let parsed = match data {
            Value::String(text) => serde_json::from_str::<Value>(text),
            other => Ok(other.clone()),
        };
        let value = match parsed {
            Ok(value) => value,
            Err(err) => {
                warn!(origin, error = %err, "unparseable message dropped");
                return None;
            }
        };

        if !value.get("type").is_some_and(Value::is_string) {
            debug!(origin, "message without string type ignored");
            return None;
        }

        match serde_json::from_value::<AuthMessage>(value) {
            Ok(message) => Some(message),
            Err(err) => {
                warn!(origin, error = %err, "malformed message dropped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthPayload, ErrorCode, MessageType};
    use serde_json::json;

    fn production() -> MessageReceiver {
        MessageReceiver::new(
            OriginPolicy::parse("https://app.example"),
            Deployment::Production,
        )
    }

    #[test]
    fn test_production_rejects_unknown_origin() {
        let message = json!({"type": "WALLET_AUTH_INIT"});
        assert!(production().accept("https://evil.example", &message).is_none());
        assert!(production().accept("https://app.example", &message).is_some());
    }

    #[test]
    fn test_development_accepts_any_origin() {
        let receiver = MessageReceiver::new(
            OriginPolicy::parse("https://app.example"),
            Deployment::Development,
        );
        let message = json!({"type": "WALLET_AUTH_INIT"});
        let accepted = receiver.accept("http://localhost:5173", &message).unwrap();
        assert_eq!(accepted.message_type(), Some(MessageType::Init));
    }

    #[test]
    fn test_string_data_is_parsed() {
        let payload = AuthPayload::success("0xABC", "0xSIG", "m", 1, "injected", 5);
        let text = payload.to_json().unwrap();
        let message = production()
            .accept("https://app.example", &Value::String(text))
            .unwrap();
        assert_eq!(message.into_payload().unwrap(), payload);
    }

    #[test]
    fn test_unparseable_or_untyped_dropped() {
        let receiver = production();
        assert!(receiver
            .accept("https://app.example", &Value::String("{not json".to_string()))
            .is_none());
        assert!(receiver.accept("https://app.example", &json!({"type": 7})).is_none());
        assert!(receiver.accept("https://app.example", &json!({"data": {}})).is_none());
    }

    #[test]
    fn test_error_message_round_trip() {
        let message = production()
            .accept(
                "https://app.example",
                &json!({"type": "WALLET_AUTH_ERROR", "error": {"code": "TIMEOUT", "message": "x"}}),
            )
            .unwrap();
        assert_eq!(message.message_type(), Some(MessageType::Error));
        assert_eq!(message.into_payload().unwrap().error_code(), Some(ErrorCode::Timeout));
    }

    #[test]
    fn test_unknown_type_kept_for_caller() {
        let message = production()
            .accept("https://app.example", &json!({"type": "SOMETHING_ELSE"}))
            .unwrap();
        assert!(message.message_type().is_none());
        assert!(message.into_payload().is_err());
    }
}
