//! World-qualified integer voxel coordinates

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::WorldId;

/// Unit offsets to the six face-adjacent cells
pub const FACE_OFFSETS: [IVec3; 6] = [
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

/// Integer coordinate identifying a voxel in a specific world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    /// Create a new voxel coordinate
    pub fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    /// Build from an integer position
    pub fn from_ivec3(world: WorldId, p: IVec3) -> Self {
        Self::new(world, p.x, p.y, p.z)
    }

    /// Convert a continuous world position to the cell containing it
    pub fn from_world_pos(world: WorldId, pos: Vec3) -> Self {
        Self {
            world,
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }

    /// Integer position without the world
    pub fn pos(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Center of the cell in continuous space
    pub fn center(&self) -> Vec3 {
        self.pos().as_vec3() + Vec3::splat(0.5)
    }

    /// Coordinate displaced by `offset` in the same world
    pub fn offset(&self, offset: IVec3) -> Self {
        Self::from_ivec3(self.world, self.pos() + offset)
    }

    /// The six face-adjacent neighbors
    pub fn face_neighbors(&self) -> impl Iterator<Item = VoxelCoord> + '_ {
        FACE_OFFSETS.iter().map(move |&o| self.offset(o))
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_pos_floors() {
        let c = VoxelCoord::from_world_pos(0, Vec3::new(1.9, -0.1, 0.0));
        assert_eq!(c, VoxelCoord::new(0, 1, -1, 0));
    }

    #[test]
    fn test_equality_includes_world() {
        assert_ne!(VoxelCoord::new(0, 1, 2, 3), VoxelCoord::new(1, 1, 2, 3));
    }

    #[test]
    fn test_face_neighbors() {
        let c = VoxelCoord::new(0, 0, 0, 0);
        let n: Vec<_> = c.face_neighbors().collect();
        assert_eq!(n.len(), 6);
        assert!(n.iter().all(|v| (v.pos() - c.pos()).abs().element_sum() == 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(VoxelCoord::new(2, 1, -3, 4).to_string(), "2:(1, -3, 4)");
    }
}
