/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public wallet-auth bridge crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod challenge;
pub mod classifier;
pub mod config;
pub mod connector;
pub mod environment;
pub mod error;
pub mod host;
pub mod origin;
pub mod receiver;
pub mod return_url;
pub mod session;
pub mod transport;
pub mod types;

pub use challenge::{Challenge, build_message, generate_nonce};
pub use classifier::{FailurePhase, classify, classify_failure};
pub use config::{BridgeConfig, SessionTimings};
pub use connector::{
    ConnectorInfo, LocalKeyConnector, MockConnector, WalletAccount, WalletConnector,
};
pub use environment::{
    Environment, EnvironmentDetector, RuntimeContext, StaticDetector, UserAgentDetector,
};
pub use error::{BridgeError, ConnectorError, Result};
pub use host::{DurableStorage, HostWindow, MemoryStorage, MockHost, RuntimeInfo, WindowRef};
pub use origin::OriginPolicy;
pub use receiver::MessageReceiver;
pub use return_url::{ReturnUrlResolver, build_redirect_url, decode_redirect_result};
pub use session::{AuthSession, AuthSessionMachine, PollOutcome, SessionEvent, StateError};
pub use transport::{Channel, Delivery, TransportDispatcher};

// Re-export all types
pub use types::*;
