//! The "sink" migration: a persisted state machine that bridges a legacy
//! system instance into a freshly deployed one.
//!
//! Every phase is written to the state store before the next is attempted,
//! so a crash at any point leaves a record of exactly how far the run got.
//! Re-running the controller resumes at the first incomplete phase and never
//! re-issues a state-changing call whose phase is already committed; the
//! later phases are not idempotent against the legacy environment.

mod controller;
mod error;
mod phase;
mod state;
mod store;

pub use controller::{MigrationController, MigrationReport, MigrationSetup};
pub use error::MigrationError;
pub use phase::MigrationPhase;
pub use state::MigrationState;
pub use store::{InMemoryStateStore, JsonFileStateStore, MigrationStateStore, StateStoreError};
