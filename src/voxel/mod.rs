//! Voxel data structures and world access

pub mod voxel;
pub mod coord;
pub mod grid;
pub mod material;

pub use voxel::{Voxel, VoxelSnapshot, MaterialId, AIR};
pub use coord::VoxelCoord;
pub use grid::{Grid, MemoryGrid, HeightLimits};
pub use material::{FragileKind, GlassColor, MaterialRegistry, FamilyDelays, palette};
