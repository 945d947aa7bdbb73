/*
[INPUT]:  Scripted runtime facts, query parameters and failure switches
[OUTPUT]: Recording host window and in-memory storage
[POS]:    Host layer - deterministic stand-ins for tests and the harness
[UPDATE]: When HostWindow or DurableStorage gain methods
*/

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DurableStorage, HostWindow, MessageTarget, RuntimeInfo};
use crate::error::{BridgeError, Result};

/// One observable side effect performed against the host
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    NativeBridge(String),
    PostMessage {
        target: MessageTarget,
        message: serde_json::Value,
        target_origin: String,
    },
    Navigate(String),
    Close,
}

/// Host window that records every call instead of performing it
#[derive(Debug)]
pub struct MockHost {
    runtime: Option<RuntimeInfo>,
    query: HashMap<String, String>,
    calls: Mutex<Vec<HostCall>>,
    opener_alive: AtomicBool,
    closed: AtomicBool,
    fail_navigation: AtomicBool,
    fail_post: AtomicBool,
    fail_bridge: AtomicBool,
}

impl MockHost {
    /// Browser host with the given runtime facts
    pub fn new(runtime: RuntimeInfo) -> Self {
        let opener_alive = runtime.opener.is_some();
        Self {
            runtime: Some(runtime),
            query: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            opener_alive: AtomicBool::new(opener_alive),
            closed: AtomicBool::new(false),
            fail_navigation: AtomicBool::new(false),
            fail_post: AtomicBool::new(false),
            fail_bridge: AtomicBool::new(false),
        }
    }

    /// Host with no global window, as during server rendering
    pub fn server() -> Self {
        let mut host = Self::new(RuntimeInfo::top_level(""));
        host.runtime = None;
        host
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set_opener_alive(&self, alive: bool) {
        self.opener_alive.store(alive, Ordering::SeqCst);
    }

    pub fn set_closed(&self, closed: bool) {
        self.closed.store(closed, Ordering::SeqCst);
    }

    pub fn fail_navigation(&self, fail: bool) {
        self.fail_navigation.store(fail, Ordering::SeqCst);
    }

    pub fn fail_post(&self, fail: bool) {
        self.fail_post.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bridge(&self, fail: bool) {
        self.fail_bridge.store(fail, Ordering::SeqCst);
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().expect("call log lock").clone()
    }

    /// URLs passed to `navigate`
    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Messages posted to related windows
    pub fn posted(&self) -> Vec<(MessageTarget, serde_json::Value, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::PostMessage {
                    target,
                    message,
                    target_origin,
                } => Some((target, message, target_origin)),
                _ => None,
            })
            .collect()
    }

    /// Texts handed to the native bridge
    pub fn bridge_messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::NativeBridge(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().expect("call log lock").push(call);
    }
}

impl HostWindow for MockHost {
    fn runtime(&self) -> Option<RuntimeInfo> {
        self.runtime.clone()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn send_to_native_bridge(&self, text: &str) -> Result<()> {
        if self.fail_bridge.load(Ordering::SeqCst) {
            return Err(BridgeError::host("native bridge rejected message"));
        }
        self.record(HostCall::NativeBridge(text.to_string()));
        Ok(())
    }

    fn post_message(
        &self,
        target: MessageTarget,
        message: &serde_json::Value,
        target_origin: &str,
    ) -> Result<()> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(BridgeError::host("postMessage rejected"));
        }
        self.record(HostCall::PostMessage {
            target,
            message: message.clone(),
            target_origin: target_origin.to_string(),
        });
        Ok(())
    }

    fn opener_alive(&self) -> bool {
        self.opener_alive.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<()> {
        self.record(HostCall::Close);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        if self.fail_navigation.load(Ordering::SeqCst) {
            return Err(BridgeError::host(format!("navigation to {url} blocked")));
        }
        self.record(HostCall::Navigate(url.to_string()));
        Ok(())
    }
}

/// `localStorage` stand-in
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().expect("storage lock").get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .expect("storage lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().expect("storage lock").remove(key);
        Ok(())
    }
}
