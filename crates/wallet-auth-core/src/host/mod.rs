/*
[INPUT]:  Page runtime (window hierarchy, location, storage, native bridge)
[OUTPUT]: Capability traits the session and dispatcher act through
[POS]:    Host layer - the only path to ambient browser state
[UPDATE]: When a new host capability is needed
*/

pub mod mock;

pub use mock::{HostCall, MemoryStorage, MockHost};

use crate::error::Result;

/// How a related window compares to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRef {
    /// The reference points back at the current window
    Current,
    /// A distinct window
    Other,
}

/// Snapshot of the runtime facts environment detection depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub user_agent: String,
    /// A native host bridge object is reachable on the global object
    pub native_bridge: bool,
    /// iOS home-screen ("standalone") launch flag
    pub standalone: bool,
    pub opener: Option<WindowRef>,
    pub parent: WindowRef,
}

impl RuntimeInfo {
    /// Top-level window with no opener and no bridge
    pub fn top_level(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            native_bridge: false,
            standalone: false,
            opener: None,
            parent: WindowRef::Current,
        }
    }

    pub fn with_native_bridge(mut self) -> Self {
        self.native_bridge = true;
        self
    }

    pub fn with_opener(mut self, opener: WindowRef) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_parent(mut self, parent: WindowRef) -> Self {
        self.parent = parent;
        self
    }

    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }
}

/// Window a structured message is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Opener,
    Parent,
}

/// Capabilities of the window the page runs in.
///
/// Every call is synchronous: in a browser these map onto `postMessage`,
/// `location.href` assignment and friends, none of which block.
pub trait HostWindow: Send + Sync {
    /// Runtime facts, or `None` outside a browser (no global window)
    fn runtime(&self) -> Option<RuntimeInfo>;

    /// Value of a query-string parameter of the current location
    fn query_param(&self, name: &str) -> Option<String>;

    /// Hand text to the native bridge's send primitive
    fn send_to_native_bridge(&self, text: &str) -> Result<()>;

    /// Post a structured message to a related window
    fn post_message(
        &self,
        target: MessageTarget,
        message: &serde_json::Value,
        target_origin: &str,
    ) -> Result<()>;

    /// Whether the opener reference is still usable
    fn opener_alive(&self) -> bool;

    /// Whether the current window has already been closed
    fn is_closed(&self) -> bool;

    fn close(&self) -> Result<()>;

    fn navigate(&self, url: &str) -> Result<()>;
}

/// Durable client-side key/value storage (localStorage)
pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}
