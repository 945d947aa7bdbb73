/*
[INPUT]:  Host runtime facts (user agent, bridge presence, window hierarchy)
[OUTPUT]: Environment classification driving auto-connect and transport choice
[POS]:    Detection layer - isolates user-agent heuristics from session logic
[UPDATE]: When wallet in-app browser identifiers or heuristics change
*/

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::debug;

use crate::host::{HostWindow, RuntimeInfo, WindowRef};

/// User-agent fragments of known wallet in-app browsers (lowercase)
const WALLET_APP_IDENTIFIERS: &[&str] = &[
    "metamaskmobile",
    "coinbasewallet",
    "trustwallet",
    "tokenpocket",
    "imtoken",
    "okapp",
    "bitkeep",
    "bitget",
    "rainbow",
    "phantom",
    "zerion",
];

/// Classification of the context the page runs in.
///
/// All flags false with `is_server` set means there is no window yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub is_server: bool,
    pub is_native_bridge: bool,
    pub is_mobile_in_app_browser: bool,
    pub is_popup: bool,
    pub is_embedded_frame: bool,
}

/// Single context implied by an [`Environment`], highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeContext {
    NativeBridge,
    InAppBrowser,
    Popup,
    EmbeddedFrame,
    PlainBrowser,
    Server,
}

impl Environment {
    pub fn server() -> Self {
        Self {
            is_server: true,
            ..Self::default()
        }
    }

    pub fn is_web_view_like(&self) -> bool {
        self.is_native_bridge || self.is_mobile_in_app_browser
    }

    pub fn is_plain_browser(&self) -> bool {
        !self.is_server
            && !self.is_native_bridge
            && !self.is_mobile_in_app_browser
            && !self.is_popup
            && !self.is_embedded_frame
    }

    /// Whether the page can act at all; false during server rendering
    pub fn can_act(&self) -> bool {
        !self.is_server
    }

    pub fn context(&self) -> RuntimeContext {
        if self.is_server {
            RuntimeContext::Server
        } else if self.is_native_bridge {
            RuntimeContext::NativeBridge
        } else if self.is_mobile_in_app_browser {
            RuntimeContext::InAppBrowser
        } else if self.is_popup {
            RuntimeContext::Popup
        } else if self.is_embedded_frame {
            RuntimeContext::EmbeddedFrame
        } else {
            RuntimeContext::PlainBrowser
        }
    }
}

/// Source of the runtime classification
pub trait EnvironmentDetector: Send + Sync {
    fn detect(&self) -> Environment;
}

/// Detector based on user-agent sniffing and window relationships.
///
/// The first browser classification is cached: none of its inputs can
/// change after load. A server classification is not cached.
pub struct UserAgentDetector {
    host: Arc<dyn HostWindow>,
    cached: OnceLock<Environment>,
}

impl UserAgentDetector {
    pub fn new(host: Arc<dyn HostWindow>) -> Self {
        Self {
            host,
            cached: OnceLock::new(),
        }
    }
}

impl EnvironmentDetector for UserAgentDetector {
    fn detect(&self) -> Environment {
        if let Some(environment) = self.cached.get() {
            return *environment;
        }

        let Some(runtime) = self.host.runtime() else {
            return Environment::server();
        };

        let environment = classify_runtime(&runtime);
        debug!(context = ?environment.context(), "environment classified");
        *self.cached.get_or_init(|| environment)
    }
}

/// Fixed classification, for hosts that know their context up front
#[derive(Debug, Clone, Copy)]
pub struct StaticDetector(pub Environment);

impl EnvironmentDetector for StaticDetector {
    fn detect(&self) -> Environment {
        self.0
    }
}

pub fn classify_runtime(runtime: &RuntimeInfo) -> Environment {
    let is_popup = matches!(runtime.opener, Some(WindowRef::Other));
    let is_embedded_frame = runtime.parent == WindowRef::Other && !is_popup;

    Environment {
        is_server: false,
        is_native_bridge: runtime.native_bridge,
        is_mobile_in_app_browser: is_mobile_in_app_browser(&runtime.user_agent, runtime.standalone),
        is_popup,
        is_embedded_frame,
    }
}

pub fn is_mobile_in_app_browser(user_agent: &str, standalone: bool) -> bool {
    let lowered = user_agent.to_ascii_lowercase();
    if WALLET_APP_IDENTIFIERS.iter().any(|id| lowered.contains(id)) {
        return true;
    }

    is_ios_embedded(user_agent, standalone) || is_android_webview(user_agent)
}

// In-app browsers on iOS drop the "Safari" token that mobile Safari sends.
fn is_ios_embedded(user_agent: &str, standalone: bool) -> bool {
    let is_ios = ["iPhone", "iPad", "iPod"]
        .iter()
        .any(|device| user_agent.contains(device));
    is_ios && user_agent.contains("AppleWebKit") && !standalone && !user_agent.contains("Safari")
}

fn is_android_webview(user_agent: &str) -> bool {
    if !user_agent.contains("Android") {
        return false;
    }
    user_agent.contains("; wv)") || has_embedded_chrome_version(user_agent)
}

/// Matches `Version/<digits.dots> Chrome/`, the token pair WebViews emit
fn has_embedded_chrome_version(user_agent: &str) -> bool {
    user_agent.match_indices("Version/").any(|(idx, token)| {
        let rest = &user_agent[idx + token.len()..];
        let Some((version, tail)) = rest.split_once(' ') else {
            return false;
        };
        !version.is_empty()
            && version.chars().all(|c| c.is_ascii_digit() || c == '.')
            && tail.starts_with("Chrome/")
    })
}
