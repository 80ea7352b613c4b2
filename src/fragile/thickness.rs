//! Single-layer detection.
//!
//! A voxel is breakable only while it belongs to a one-cell-thick sheet or
//! line. Along each principal axis the analyzer looks two cells deep in
//! both directions; the axis is *open* when none of those four cells holds
//! fragile material. A voxel with at least one open axis is single-layer.
//!
//! A flat 5x5x1 pane keeps its normal axis open at every cell, so the whole
//! pane is breakable however large it is. Stack a second layer on it and no
//! axis stays open anywhere.

use glam::IVec3;

use crate::voxel::coord::VoxelCoord;
use crate::voxel::grid::{read_or_empty, Grid};
use crate::voxel::material::MaterialRegistry;

/// How far along each axis the analyzer looks
pub const PROBE_DEPTH: i32 = 2;

const AXES: [IVec3; 3] = [IVec3::X, IVec3::Y, IVec3::Z];

/// Breakability test over the live grid
pub struct ThicknessAnalyzer<'a> {
    registry: &'a MaterialRegistry,
    grid: &'a dyn Grid,
}

impl<'a> ThicknessAnalyzer<'a> {
    pub fn new(registry: &'a MaterialRegistry, grid: &'a dyn Grid) -> Self {
        Self { registry, grid }
    }

    /// Whether the cell holds fragile material. Unreadable cells do not.
    pub fn is_fragile_at(&self, coord: VoxelCoord) -> bool {
        self.registry.is_fragile(read_or_empty(self.grid, coord).material_id)
    }

    /// Whether no fragile material lies within `PROBE_DEPTH` along `axis`
    pub fn is_axis_open(&self, coord: VoxelCoord, axis: IVec3) -> bool {
        (1..=PROBE_DEPTH).all(|depth| {
            !self.is_fragile_at(coord.offset(axis * depth))
                && !self.is_fragile_at(coord.offset(-axis * depth))
        })
    }

    /// Whether the voxel is part of a single-layer (breakable) structure
    pub fn is_single_layer(&self, coord: VoxelCoord) -> bool {
        AXES.iter().any(|&axis| self.is_axis_open(coord, axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragile::config::ShatterConfig;
    use crate::math::VoxelBox;
    use crate::voxel::grid::{HeightLimits, MemoryGrid};
    use crate::voxel::material::palette;
    use crate::voxel::voxel::Voxel;

    fn registry() -> MaterialRegistry {
        ShatterConfig::default().registry()
    }

    #[test]
    fn test_flat_pane_breakable_everywhere() {
        let reg = registry();
        let mut grid = MemoryGrid::new();
        let pane = VoxelBox::new(IVec3::ZERO, IVec3::new(4, 4, 0));
        grid.fill(0, pane, Voxel::of(palette::GLASS));

        let analyzer = ThicknessAnalyzer::new(&reg, &grid);
        for p in pane.cells() {
            assert!(analyzer.is_single_layer(VoxelCoord::from_ivec3(0, p)), "{:?}", p);
        }
    }

    #[test]
    fn test_double_layer_breakable_nowhere() {
        let reg = registry();
        let mut grid = MemoryGrid::new();
        let slab = VoxelBox::new(IVec3::ZERO, IVec3::new(4, 4, 1));
        grid.fill(0, slab, Voxel::of(palette::GLASS));

        let analyzer = ThicknessAnalyzer::new(&reg, &grid);
        for p in slab.cells() {
            assert!(!analyzer.is_single_layer(VoxelCoord::from_ivec3(0, p)), "{:?}", p);
        }
    }

    #[test]
    fn test_isolated_voxel_is_thin() {
        let reg = registry();
        let mut grid = MemoryGrid::new();
        let c = VoxelCoord::new(0, 3, 3, 3);
        grid.set(c, Voxel::of(palette::TINTED_GLASS)).unwrap();
        assert!(ThicknessAnalyzer::new(&reg, &grid).is_single_layer(c));
    }

    #[test]
    fn test_non_fragile_neighbors_do_not_count() {
        let reg = registry();
        let mut grid = MemoryGrid::new();
        // Glass pane backed by a stone wall
        grid.fill(0, VoxelBox::new(IVec3::ZERO, IVec3::new(2, 2, 0)), Voxel::of(palette::GLASS));
        grid.fill(0, VoxelBox::new(IVec3::new(0, 0, 1), IVec3::new(2, 2, 1)), Voxel::of(1));
        let analyzer = ThicknessAnalyzer::new(&reg, &grid);
        assert!(analyzer.is_single_layer(VoxelCoord::new(0, 1, 1, 0)));
    }

    #[test]
    fn test_world_edge_defaults_to_thin() {
        let reg = registry();
        let mut grid = MemoryGrid::with_limits(HeightLimits { min_y: 0, max_y: 4 });
        // Horizontal sheet on the top row: cells above are out of bounds
        grid.fill(0, VoxelBox::new(IVec3::new(0, 4, 0), IVec3::new(4, 4, 4)), Voxel::of(palette::GLASS));
        let analyzer = ThicknessAnalyzer::new(&reg, &grid);
        assert!(analyzer.is_single_layer(VoxelCoord::new(0, 2, 4, 2)));
    }

    #[test]
    fn test_depth_two_check() {
        let reg = registry();
        let mut grid = MemoryGrid::new();
        let c = VoxelCoord::new(0, 0, 0, 0);
        grid.set(c, Voxel::of(palette::GLASS)).unwrap();
        // Another glass two cells away along every axis closes them all
        for axis in AXES {
            grid.set(c.offset(axis * 2), Voxel::of(palette::GLASS)).unwrap();
        }
        let analyzer = ThicknessAnalyzer::new(&reg, &grid);
        assert!(!analyzer.is_axis_open(c, IVec3::X));
        assert!(!analyzer.is_single_layer(c));
    }
}
