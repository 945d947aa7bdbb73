/*
[INPUT]:  Public API exports for wallet-auth-harness crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod scenario;

// Re-export main types for convenience
pub use scenario::{DeliveryRecord, Scenario, ScenarioOptions, ScenarioReport, run_scenario};
