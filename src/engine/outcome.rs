//! Results reported by the trigger entry points

use serde::Serialize;

use crate::core::types::Tick;
use crate::fragile::config::{Feature, FeatureFlags};
use crate::fragile::trigger::TriggerKind;
use crate::voxel::coord::VoxelCoord;

/// Why a confirmed candidate produced no break
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    NotFragile,
    /// Part of a multi-layer mass
    Thick,
    AlreadyBroken,
    RegionDenied,
    /// Out of bounds or in an unloaded region
    Unreadable,
    /// Restores could not be scheduled; the voxels were repainted at once
    SchedulingFailure,
}

/// What a trigger event did. Entry points never fail; they report one of these.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BreakOutcome {
    /// The event is not a trigger (too slow, spectator, ...)
    NoTrigger,
    /// The trigger family is switched off
    Disabled { feature: Feature },
    /// The actor broke glass too recently
    CoolingDown,
    /// No fragile voxel was found near the motion
    Miss,
    Refused { origin: VoxelCoord, reason: Refusal },
    Broken {
        trigger: TriggerKind,
        origin: VoxelCoord,
        coords: Vec<VoxelCoord>,
        /// The structure exceeded the size cap
        truncated: bool,
    },
}

impl BreakOutcome {
    /// Number of voxels committed
    pub fn broken_count(&self) -> usize {
        match self {
            BreakOutcome::Broken { coords, .. } => coords.len(),
            _ => 0,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken_count() > 0
    }
}

/// Snapshot of engine state for reporting
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineStatus {
    pub tick: Tick,
    pub features: FeatureFlags,
    pub broken: usize,
    pub pending_restores: usize,
    pub total_breaks: u64,
    pub tracked_actors: usize,
}
