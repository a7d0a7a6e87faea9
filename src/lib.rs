//! Deployment orchestration for the Dromos exchange.
//!
//! Ties the workspace crates together: the declarative plan catalog, the
//! deploy-configure-migrate pipeline, and a deterministic rehearsal
//! environment for dry-running a whole deployment without touching a chain.

pub mod pipeline;
pub mod plans;
pub mod rehearsal;

pub use pipeline::{Orchestrator, PipelineError};
pub use rehearsal::RehearsalEnvironment;
