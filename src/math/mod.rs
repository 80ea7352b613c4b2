//! Mathematical utilities for voxel-space queries

pub mod voxel_box;
pub mod segment;

pub use voxel_box::VoxelBox;
pub use segment::Segment;
