//! Collision scanning.
//!
//! Turns continuous body motion into candidate voxel coordinates. Three
//! scans exist:
//!
//! - **point**: the body sample offsets at a single position
//! - **path**: interpolated samples along the motion segment, first hit wins
//! - **directional**: a small cuboid around the body, keeping only cells
//!   that lie ahead of travel
//!
//! Every scan visits cells in a fixed order so the same motion over the
//! same grid always yields the same candidate.

use glam::Vec3;

use crate::core::types::WorldId;
use crate::math::{Segment, VoxelBox};
use crate::voxel::coord::VoxelCoord;
use crate::voxel::grid::{read_or_empty, Grid};
use crate::voxel::material::MaterialRegistry;
use super::config::{Neighborhood, PathScanConfig};

/// Finds fragile voxels touched by a moving body
pub struct CollisionScanner<'a> {
    registry: &'a MaterialRegistry,
    grid: &'a dyn Grid,
    path: &'a PathScanConfig,
    offsets: Vec<Vec3>,
}

impl<'a> CollisionScanner<'a> {
    pub fn new(registry: &'a MaterialRegistry, grid: &'a dyn Grid, path: &'a PathScanConfig) -> Self {
        Self {
            registry,
            grid,
            path,
            offsets: path.offsets(),
        }
    }

    fn fragile(&self, coord: VoxelCoord) -> bool {
        self.registry.is_fragile(read_or_empty(self.grid, coord).material_id)
    }

    /// Fragile cells under the body sample offsets at `pos`, without duplicates
    pub fn point_scan(&self, world: WorldId, pos: Vec3) -> Vec<VoxelCoord> {
        let mut hits = Vec::new();
        for offset in &self.offsets {
            let coord = VoxelCoord::from_world_pos(world, pos + *offset);
            if !hits.contains(&coord) && self.fragile(coord) {
                hits.push(coord);
            }
        }
        hits
    }

    /// First fragile cell along the segment from `from` to `to`.
    ///
    /// Displacements no longer than the configured threshold are not
    /// sampled. The starting position is excluded; the final sample sits
    /// exactly on `to`.
    pub fn path_scan(&self, world: WorldId, from: Vec3, to: Vec3) -> Option<VoxelCoord> {
        let segment = Segment::new(from, to);
        if segment.length() <= self.path.threshold {
            return None;
        }

        let count = segment.sample_count(self.path.step, self.path.min_samples, self.path.max_samples);
        for sample in segment.samples(count) {
            for offset in &self.offsets {
                let coord = VoxelCoord::from_world_pos(world, sample + *offset);
                if self.fragile(coord) {
                    return Some(coord);
                }
            }
        }
        None
    }

    /// Nearest fragile cell in the neighborhood of `pos` lying ahead of `direction`.
    ///
    /// The body's own cell is skipped. A cell is ahead when the vector from
    /// `pos` to its center has a positive dot product with `direction`.
    /// Equally near cells resolve to the first in iteration order.
    pub fn directional_scan(
        &self,
        world: WorldId,
        pos: Vec3,
        direction: Vec3,
        neighborhood: Neighborhood,
    ) -> Option<VoxelCoord> {
        let direction = direction.try_normalize()?;
        let body = VoxelCoord::from_world_pos(world, pos);
        let region = VoxelBox::around_with(
            body.pos(),
            neighborhood.horizontal,
            neighborhood.y_min,
            neighborhood.y_max,
        );

        region
            .cells()
            .filter(|&p| p != body.pos())
            .map(|p| VoxelCoord::from_ivec3(world, p))
            .filter(|&coord| (coord.center() - pos).dot(direction) > 0.0 && self.fragile(coord))
            .min_by(|a, b| {
                a.center()
                    .distance_squared(pos)
                    .total_cmp(&b.center().distance_squared(pos))
            })
    }

    /// Candidate for one motion sample.
    ///
    /// Tries the path, then the body position at `to`, then the directional
    /// neighborhood when one is given.
    pub fn scan_motion(
        &self,
        world: WorldId,
        from: Vec3,
        to: Vec3,
        neighborhood: Option<Neighborhood>,
    ) -> Option<VoxelCoord> {
        if let Some(hit) = self.path_scan(world, from, to) {
            return Some(hit);
        }
        if let Some(&hit) = self.point_scan(world, to).first() {
            return Some(hit);
        }
        let found = neighborhood.and_then(|n| self.directional_scan(world, to, to - from, n));
        if found.is_none() {
            log::trace!("No fragile voxel near motion {} -> {}", from, to);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use crate::fragile::config::ShatterConfig;
    use crate::voxel::grid::MemoryGrid;
    use crate::voxel::material::palette;
    use crate::voxel::voxel::Voxel;

    fn glass_at(grid: &mut MemoryGrid, x: i32, y: i32, z: i32) -> VoxelCoord {
        let c = VoxelCoord::new(0, x, y, z);
        grid.set(c, Voxel::of(palette::GLASS)).unwrap();
        c
    }

    #[test]
    fn test_path_hits_midpoint() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        let target = glass_at(&mut grid, 1, 0, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let from = Vec3::new(0.75, 0.5, 0.5);
        let to = Vec3::new(1.25, 0.5, 0.5);
        assert_eq!(scanner.path_scan(0, from, to), Some(target));
    }

    #[test]
    fn test_zero_displacement_reports_nothing() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        glass_at(&mut grid, 0, 0, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let p = Vec3::new(0.5, 0.5, 0.5);
        assert_eq!(scanner.path_scan(0, p, p), None);
    }

    #[test]
    fn test_path_head_offset() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        // Glass at head height only
        let target = glass_at(&mut grid, 2, 1, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let hit = scanner.path_scan(0, Vec3::new(0.5, 0.2, 0.5), Vec3::new(3.5, 0.2, 0.5));
        assert_eq!(hit, Some(target));
    }

    #[test]
    fn test_path_first_hit_wins() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        let near = glass_at(&mut grid, 1, 0, 0);
        glass_at(&mut grid, 2, 0, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let hit = scanner.path_scan(0, Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.5, 0.5, 0.5));
        assert_eq!(hit, Some(near));
    }

    #[test]
    fn test_point_scan_dedups() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        let feet = glass_at(&mut grid, 0, 0, 0);
        let head = glass_at(&mut grid, 0, 1, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        assert_eq!(scanner.point_scan(0, Vec3::new(0.5, 0.1, 0.5)), vec![feet, head]);
    }

    #[test]
    fn test_directional_scan_ignores_cells_behind() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        glass_at(&mut grid, -1, 0, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let n = Neighborhood { horizontal: 1, y_min: 0, y_max: 2 };
        let pos = Vec3::new(0.5, 0.0, 0.5);
        assert_eq!(scanner.directional_scan(0, pos, Vec3::X, n), None);

        let ahead = glass_at(&mut grid, 1, 1, 0);
        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        assert_eq!(scanner.directional_scan(0, pos, Vec3::X, n), Some(ahead));
    }

    #[test]
    fn test_directional_scan_below_when_falling() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        let below = glass_at(&mut grid, 1, 3, 0);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let n = Neighborhood { horizontal: 2, y_min: -2, y_max: 2 };
        let hit = scanner.directional_scan(0, Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y, n);
        assert_eq!(hit.map(|c| c.pos()), Some(below.pos()));
        assert!(scanner.directional_scan(0, Vec3::new(0.5, 5.0, 0.5), Vec3::ZERO, n).is_none());
    }

    #[test]
    fn test_scan_motion_falls_back_to_neighborhood() {
        let config = ShatterConfig::default();
        let reg = config.registry();
        let mut grid = MemoryGrid::new();
        // Off the straight line, but ahead and beside the body
        let side = glass_at(&mut grid, 2, 0, 1);

        let scanner = CollisionScanner::new(&reg, &grid, &config.path);
        let from = Vec3::new(0.5, 0.0, 0.5);
        let to = Vec3::new(1.5, 0.0, 0.5);
        assert_eq!(scanner.scan_motion(0, from, to, None), None);
        let n = Neighborhood { horizontal: 1, y_min: 0, y_max: 2 };
        assert_eq!(scanner.scan_motion(0, from, to, Some(n)), Some(side));
        assert_eq!(side.pos(), IVec3::new(2, 0, 1));
    }
}
