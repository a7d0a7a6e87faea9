use thiserror::Error;

use dromos_types::TableError;

use crate::{MigrationPhase, StateStoreError};

#[derive(Debug, Error)]
pub enum MigrationError {
    /// `Init` refused to create state. Nothing has happened on chain.
    #[error("migration precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    /// A phase's side effect failed. State is persisted up to the last
    /// committed phase; re-running resumes there.
    #[error("migration phase {phase} failed: {reason}")]
    PhaseFailed {
        phase: MigrationPhase,
        reason: String,
    },

    /// The persisted record is missing a field its phase implies.
    #[error("invalid migration state: {reason}")]
    InvalidState { reason: String },

    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error(transparent)]
    Table(#[from] TableError),
}
