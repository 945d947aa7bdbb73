/*
[INPUT]:  Query string (`returnUrl`, `redirect_uri`, `callback`) and durable storage
[OUTPUT]: Resolved host callback URL and redirect URLs carrying the result
[POS]:    Transport support - deep-link hand-off across browser/wallet round trips
[UPDATE]: When callback parameter names or redirect encoding change
*/

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::error::{BridgeError, Result};
use crate::host::{DurableStorage, HostWindow};
use crate::types::AuthPayload;

/// Query parameters carrying the callback URL, highest precedence first
pub const RETURN_URL_PARAMS: [&str; 3] = ["returnUrl", "redirect_uri", "callback"];

/// Query parameter the result is appended under
pub const RESULT_PARAM: &str = "result";

/// Host used when `callback` names a bare URL scheme
pub const DEFAULT_APP_SCHEME: &str = "wallet-auth";

/// Finds the host callback URL and keeps it alive across a wallet-app hop
pub struct ReturnUrlResolver {
    host: Arc<dyn HostWindow>,
    storage: Arc<dyn DurableStorage>,
    storage_key: String,
    app_scheme: String,
}

impl ReturnUrlResolver {
    pub fn new(
        host: Arc<dyn HostWindow>,
        storage: Arc<dyn DurableStorage>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            host,
            storage,
            storage_key: storage_key.into(),
            app_scheme: DEFAULT_APP_SCHEME.to_string(),
        }
    }

    /// Host a bare `callback` scheme expands to (`<scheme>://<app_scheme>`)
    pub fn with_app_scheme(mut self, app_scheme: impl Into<String>) -> Self {
        self.app_scheme = app_scheme.into();
        self
    }

    /// Callback URL from the current query string only
    pub fn from_query(&self) -> Option<String> {
        RETURN_URL_PARAMS.iter().find_map(|name| {
            let value = self.host.query_param(name)?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            Some(if *name == "callback" {
                expand_bare_scheme(value, &self.app_scheme)
            } else {
                value.to_string()
            })
        })
    }

    /// Run once at load: cache a query-supplied callback URL
    pub fn capture(&self) -> Option<String> {
        let return_url = self.from_query()?;
        if let Err(err) = self.storage.set_item(&self.storage_key, &return_url) {
            warn!(error = %err, "failed to cache return url");
        } else {
            debug!(return_url = %return_url, "return url cached");
        }
        Some(return_url)
    }

    /// Query string first, then the cached value
    pub fn resolve(&self) -> Option<String> {
        self.from_query().or_else(|| {
            self.storage
                .get_item(&self.storage_key)
                .filter(|cached| !cached.trim().is_empty())
        })
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove_item(&self.storage_key) {
            warn!(error = %err, "failed to clear cached return url");
        }
    }
}

/// `myapp` becomes `myapp://wallet-auth`; anything with a scheme is kept
fn expand_bare_scheme(value: &str, app_scheme: &str) -> String {
    if value.contains(':') {
        value.to_string()
    } else {
        format!("{value}://{app_scheme}")
    }
}

/// Percent-encode like `encodeURIComponent` (space as %20, not `+`)
fn encode_component(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `<return_url><?|&>result=<url-encoded JSON>`
pub fn build_redirect_url(return_url: &str, payload: &AuthPayload) -> Result<String> {
    let json = payload.to_json()?;
    let separator = if return_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{return_url}{separator}{RESULT_PARAM}={}",
        encode_component(&json)
    ))
}

/// Host side: recover the payload from a redirect URL
pub fn decode_redirect_result(redirect_url: &str) -> Result<AuthPayload> {
    let url = Url::parse(redirect_url)?;
    let encoded = url
        .query_pairs()
        .find(|(name, _)| name == RESULT_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            BridgeError::InvalidPayload(format!("no `{RESULT_PARAM}` parameter in redirect url"))
        })?;
    AuthPayload::from_json(&encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryStorage, MockHost, RuntimeInfo};
    use crate::types::{AuthFailure, ErrorCode};

    const KEY: &str = "wallet_auth_return_url";

    fn resolver(host: MockHost, storage: Arc<MemoryStorage>) -> ReturnUrlResolver {
        ReturnUrlResolver::new(Arc::new(host), storage, KEY)
    }

    fn host() -> MockHost {
        MockHost::new(RuntimeInfo::top_level("ua"))
    }

    #[test]
    fn test_parameter_precedence() {
        let storage = Arc::new(MemoryStorage::new());
        let r = resolver(
            host()
                .with_query("callback", "myapp")
                .with_query("redirect_uri", "https://b.example/cb")
                .with_query("returnUrl", "https://a.example/cb"),
            storage,
        );
        assert_eq!(r.from_query().as_deref(), Some("https://a.example/cb"));
    }

    #[test]
    fn test_bare_callback_scheme() {
        let storage = Arc::new(MemoryStorage::new());
        let r = resolver(host().with_query("callback", "myapp"), storage.clone());
        assert_eq!(r.from_query().as_deref(), Some("myapp://wallet-auth"));

        let r = resolver(host().with_query("callback", "myapp://done"), storage.clone());
        assert_eq!(r.from_query().as_deref(), Some("myapp://done"));

        let r = resolver(host().with_query("callback", "myapp"), storage).with_app_scheme("login");
        assert_eq!(r.from_query().as_deref(), Some("myapp://login"));
    }

    #[test]
    fn test_capture_survives_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let first = resolver(host().with_query("returnUrl", "myapp://cb"), storage.clone());
        assert_eq!(first.capture().as_deref(), Some("myapp://cb"));

        // wallet app reopens the page without the query string
        let second = resolver(host(), storage.clone());
        assert_eq!(second.resolve().as_deref(), Some("myapp://cb"));

        second.clear();
        assert!(second.resolve().is_none());
    }

    #[test]
    fn test_capture_without_param_leaves_cache() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(KEY, "myapp://old").unwrap();
        let r = resolver(host(), storage.clone());
        assert!(r.capture().is_none());
        assert_eq!(storage.get_item(KEY).as_deref(), Some("myapp://old"));
    }

    #[test]
    fn test_redirect_separator() {
        let payload = AuthPayload::failure(AuthFailure::from_code(ErrorCode::Timeout));
        let plain = build_redirect_url("https://host.example/cb", &payload).unwrap();
        assert!(plain.starts_with("https://host.example/cb?result=%7B"));

        let with_query = build_redirect_url("https://host.example/cb?state=1", &payload).unwrap();
        assert!(with_query.starts_with("https://host.example/cb?state=1&result="));
    }

    #[test]
    fn test_redirect_encodes_spaces_as_percent20() {
        let payload = AuthPayload::failure(AuthFailure::from_code(ErrorCode::Timeout));
        let url = build_redirect_url("myapp://cb", &payload).unwrap();
        assert!(!url.contains('+'));
        assert!(url.contains("%20"));
    }

    #[test]
    fn test_decode_redirect_result() {
        let payload = AuthPayload::success("0xABC", "0xSIG", "Sign in\n\nNonce: 1+2", 1, "metaMask", 42);
        let url = build_redirect_url("https://host.example/cb?state=x", &payload).unwrap();
        assert_eq!(decode_redirect_result(&url).unwrap(), payload);
    }

    #[test]
    fn test_decode_without_result_param() {
        let err = decode_redirect_result("https://host.example/cb?state=x").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPayload(_)));
    }
}
