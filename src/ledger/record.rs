//! Broken voxel records

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, Tick};
use crate::voxel::coord::VoxelCoord;
use crate::voxel::material::FragileKind;
use crate::voxel::voxel::VoxelSnapshot;
use super::timer::TimerHandle;

/// One currently broken voxel.
///
/// Exists exactly while the voxel is broken; the ledger holds at most one
/// per coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrokenVoxelRecord {
    pub coord: VoxelCoord,
    /// Cell contents captured before the break
    pub snapshot: VoxelSnapshot,
    pub kind: FragileKind,
    pub broken_at: Tick,
    /// Pending restore; None while regeneration is disabled
    pub handle: Option<TimerHandle>,
    /// Actor credited with the break
    pub actor: Option<ActorId>,
}

/// What `BreakLedger::restore` did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// The voxel was repainted from its snapshot
    Repainted,
    /// Something else occupies the cell; the record was dropped without repainting
    Occupied,
    /// The cell could not be written; the record was dropped anyway
    Unwritable,
    /// No record existed
    NotBroken,
    /// A due task whose handle no longer matches the record
    Stale,
}

impl RestoreOutcome {
    /// Whether a record was resolved
    pub fn resolved(&self) -> bool {
        matches!(
            self,
            RestoreOutcome::Repainted | RestoreOutcome::Occupied | RestoreOutcome::Unwritable
        )
    }
}

/// Totals from a forced flush
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub restored: usize,
    pub repainted: usize,
    pub occupied: usize,
    /// Pending timers cancelled by the flush
    pub cancelled: usize,
}
