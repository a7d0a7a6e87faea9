use serde::{Deserialize, Serialize};

use dromos_types::{Address, Amount};

use crate::MigrationPhase;

/// Persistent record of one migration run.
///
/// Owned exclusively by the controller and written back after every phase
/// transition. The record is what makes a restart safe: fields filled by a
/// completed phase (the lock id above all) survive the crash and are never
/// recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    /// Last committed phase.
    pub phase: MigrationPhase,

    /// The fixed legacy amount moved into custody.
    pub legacy_locked_amount: Amount,

    /// Identifier of the permanent lock, known once
    /// `PermanentLockCreated` commits.
    pub permanent_lock_id: Option<u64>,

    /// Address of the bridging facilitator, known once
    /// `FacilitatorDeployed` commits.
    pub facilitator_address: Option<Address>,

    pub legacy_gauge_drained: bool,

    pub finalized: bool,

    pub created_at: u64,
    pub updated_at: u64,
}

impl MigrationState {
    /// Fresh record at `Init`: preconditions hold, nothing has happened yet.
    pub fn new(created_at: u64) -> Self {
        Self {
            phase: MigrationPhase::Init,
            legacy_locked_amount: Amount::zero(),
            permanent_lock_id: None,
            facilitator_address: None,
            legacy_gauge_drained: false,
            finalized: false,
            created_at,
            updated_at: created_at,
        }
    }

    /// Commit a phase transition.
    pub fn advance(&mut self, phase: MigrationPhase, now: u64) {
        self.phase = phase;
        self.updated_at = now;
    }

    /// Whether `phase` has already been committed.
    pub fn completed(&self, phase: MigrationPhase) -> bool {
        self.phase >= phase
    }
}
