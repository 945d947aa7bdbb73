/*
[INPUT]:  Connector, host, environment and transport layers
[OUTPUT]: AuthSession state and the AuthSessionMachine driver
[POS]:    Session layer - module wiring
[UPDATE]: When session modules or exports change
*/

pub mod machine;
pub mod state;

pub use machine::{AuthSessionMachine, PollOutcome};
pub use state::{AuthSession, SessionEvent, StateError};
