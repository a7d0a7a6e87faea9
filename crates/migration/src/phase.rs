use serde::{Deserialize, Serialize};
use std::fmt;

/// One persisted, monotonic step of the migration.
///
/// Phases only move forward. The derived ordering matches execution order,
/// so `phase >= MigrationPhase::AssetEscrowed` reads the way it sounds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    /// Preconditions validated, state record created.
    Init,
    /// The bridging facilitator is deployed and wired to both systems.
    FacilitatorDeployed,
    /// The fixed legacy amount sits in legacy custody for the bridge.
    AssetEscrowed,
    /// The permanent lock exists and its identifier is recorded.
    PermanentLockCreated,
    /// The facilitator has registered the lock as its owned position.
    OwnershipRegistered,
    /// The legacy drain gauge is active; no further emissions are lost.
    LegacyGaugeDrained,
    /// Admin control renounced. Terminal.
    Finalized,
}

impl MigrationPhase {
    pub const ALL: [MigrationPhase; 7] = [
        MigrationPhase::Init,
        MigrationPhase::FacilitatorDeployed,
        MigrationPhase::AssetEscrowed,
        MigrationPhase::PermanentLockCreated,
        MigrationPhase::OwnershipRegistered,
        MigrationPhase::LegacyGaugeDrained,
        MigrationPhase::Finalized,
    ];

    /// The phase after this one, or `None` at the terminal phase.
    pub fn next(self) -> Option<MigrationPhase> {
        let position = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(position + 1).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            MigrationPhase::Init => "init",
            MigrationPhase::FacilitatorDeployed => "facilitator_deployed",
            MigrationPhase::AssetEscrowed => "asset_escrowed",
            MigrationPhase::PermanentLockCreated => "permanent_lock_created",
            MigrationPhase::OwnershipRegistered => "ownership_registered",
            MigrationPhase::LegacyGaugeDrained => "legacy_gauge_drained",
            MigrationPhase::Finalized => "finalized",
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
