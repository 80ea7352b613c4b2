//! Voxel cell value

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Host material identifier. `0` is reserved for air.
pub type MaterialId = u16;

/// Material id of an empty cell
pub const AIR: MaterialId = 0;

/// Single voxel - exactly 4 bytes.
///
/// A voxel copy is also the snapshot captured when glass breaks: the
/// material plus the opaque orientation/shape bits are enough to paint the
/// cell back bit-for-bit.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Voxel {
    /// Material ID (host palette index)
    pub material_id: MaterialId,
    /// Orientation / connection / shape bits, opaque to the engine
    pub state: u16,
}

/// Snapshot of a voxel taken at break time
pub type VoxelSnapshot = Voxel;

impl Voxel {
    /// Empty/air voxel
    pub const EMPTY: Voxel = Voxel {
        material_id: AIR,
        state: 0,
    };

    /// Create a voxel with explicit state bits
    pub fn new(material_id: MaterialId, state: u16) -> Self {
        Self { material_id, state }
    }

    /// Create a voxel with default state bits
    pub fn of(material_id: MaterialId) -> Self {
        Self::new(material_id, 0)
    }

    /// Create a copy of this voxel with the given state bits
    pub fn with_state(self, state: u16) -> Self {
        Self { state, ..self }
    }

    /// Check if voxel is empty (air)
    pub fn is_empty(&self) -> bool {
        self.material_id == AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<Voxel>(), 4);
    }

    #[test]
    fn test_empty() {
        assert!(Voxel::EMPTY.is_empty());
        assert!(Voxel::default().is_empty());
        assert!(!Voxel::of(20).is_empty());
    }

    #[test]
    fn test_state_is_preserved() {
        let v = Voxel::of(102).with_state(0b1010);
        assert_eq!(v.material_id, 102);
        assert_eq!(v.state, 0b1010);
        assert_eq!(bytemuck::bytes_of(&v).len(), 4);
    }
}
