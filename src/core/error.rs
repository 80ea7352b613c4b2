//! Error types for the shatter engine

use thiserror::Error;

use crate::voxel::coord::VoxelCoord;

/// Main error type for the engine.
///
/// Most variants are recovered where they are detected; the trigger entry
/// points on [`crate::engine::Engine`] never surface them to the host.
#[derive(Debug, Error)]
pub enum Error {
    #[error("voxel {0} is already broken")]
    AlreadyBroken(VoxelCoord),

    #[error("region authority denied alteration at {0}")]
    RegionDenied(VoxelCoord),

    #[error("voxel {0} is outside the addressable grid")]
    OutOfBounds(VoxelCoord),

    #[error("voxel {0} lies in an unloaded region")]
    UnloadedRegion(VoxelCoord),

    #[error("could not schedule restoration: {0}")]
    SchedulingFailure(String),

    #[error("effects sink error: {0}")]
    Effects(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for grid access failures that callers treat as "not fragile".
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Error::OutOfBounds(_) | Error::UnloadedRegion(_))
    }
}
