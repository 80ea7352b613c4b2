//! Integer axis-aligned box over voxel cells

use crate::core::types::{IVec3, Vec3};

/// Axis-aligned box of voxel cells, inclusive on both corners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelBox {
    pub min: IVec3,
    pub max: IVec3,
}

impl VoxelBox {
    /// Create box from min and max corners (inclusive)
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Cube of cells within `radius` of `center` along every axis
    pub fn around(center: IVec3, radius: i32) -> Self {
        let r = IVec3::splat(radius.max(0));
        Self::new(center - r, center + r)
    }

    /// Box with independent horizontal and vertical extents relative to `center`
    pub fn around_with(center: IVec3, horizontal: i32, y_min: i32, y_max: i32) -> Self {
        let h = horizontal.max(0);
        Self::new(
            center + IVec3::new(-h, y_min, -h),
            center + IVec3::new(h, y_max, h),
        )
    }

    /// Number of cells along each axis
    pub fn size(&self) -> IVec3 {
        self.max - self.min + IVec3::ONE
    }

    /// Total number of cells in the box
    pub fn volume(&self) -> usize {
        let s = self.size();
        s.x as usize * s.y as usize * s.z as usize
    }

    /// Check if a cell lies inside the box
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Center of the box in continuous space
    pub fn center(&self) -> Vec3 {
        (self.min.as_vec3() + self.max.as_vec3() + Vec3::ONE) * 0.5
    }

    /// Iterate every cell in x-major, then y, then z order.
    ///
    /// The order is fixed so scans built on top of it are deterministic.
    pub fn cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        (self.min.x..=self.max.x).flat_map(move |x| {
            (self.min.y..=self.max.y).flat_map(move |y| {
                (self.min.z..=self.max.z).map(move |z| IVec3::new(x, y, z))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around() {
        let b = VoxelBox::around(IVec3::new(1, 2, 3), 1);
        assert_eq!(b.min, IVec3::new(0, 1, 2));
        assert_eq!(b.max, IVec3::new(2, 3, 4));
        assert_eq!(b.volume(), 27);
    }

    #[test]
    fn test_new_normalizes_corners() {
        let b = VoxelBox::new(IVec3::new(3, 0, 0), IVec3::new(0, 1, 1));
        assert_eq!(b.min, IVec3::ZERO);
        assert_eq!(b.size(), IVec3::new(4, 2, 2));
    }

    #[test]
    fn test_cells_order_and_count() {
        let b = VoxelBox::new(IVec3::ZERO, IVec3::new(1, 1, 1));
        let cells: Vec<_> = b.cells().collect();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0], IVec3::ZERO);
        assert_eq!(cells[1], IVec3::new(0, 0, 1));
        assert_eq!(cells[7], IVec3::ONE);
    }

    #[test]
    fn test_around_with() {
        let b = VoxelBox::around_with(IVec3::ZERO, 2, 0, 2);
        assert!(b.contains(IVec3::new(-2, 0, 2)));
        assert!(!b.contains(IVec3::new(0, -1, 0)));
        assert_eq!(b.volume(), 5 * 3 * 5);
    }
}
