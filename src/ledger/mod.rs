//! Break ledger and deferred restoration

pub mod record;
pub mod timer;
pub mod ledger;

use std::collections::HashSet;

use crate::voxel::coord::VoxelCoord;

pub use record::{BrokenVoxelRecord, FlushReport, RestoreOutcome};
pub use timer::{DueRestore, TaskState, TickScheduler, TimerHandle, TimerService};
pub use ledger::{BreakLedger, BreakRequest, LedgerContext, LedgerView};

/// Anything that can answer "is this voxel currently broken"
pub trait BrokenIndex {
    fn is_broken(&self, coord: VoxelCoord) -> bool;
}

impl BrokenIndex for BreakLedger {
    fn is_broken(&self, coord: VoxelCoord) -> bool {
        BreakLedger::is_broken(self, coord)
    }
}

impl BrokenIndex for LedgerView {
    fn is_broken(&self, coord: VoxelCoord) -> bool {
        LedgerView::is_broken(self, coord)
    }
}

impl BrokenIndex for HashSet<VoxelCoord> {
    fn is_broken(&self, coord: VoxelCoord) -> bool {
        self.contains(&coord)
    }
}
