//! World storage access

use std::collections::{HashMap, HashSet};

use crate::core::error::Error;
use crate::core::types::{Result, WorldId};
use crate::math::VoxelBox;
use super::coord::VoxelCoord;
use super::voxel::Voxel;

/// Read/write access to the host's voxel storage.
///
/// Implementations report `OutOfBounds` / `UnloadedRegion` for cells they
/// cannot address; the engine treats those as non-fragile.
pub trait Grid {
    fn get(&self, coord: VoxelCoord) -> Result<Voxel>;
    fn set(&mut self, coord: VoxelCoord, voxel: Voxel) -> Result<()>;
}

/// Read a cell, mapping unreadable space to air.
pub fn read_or_empty(grid: &dyn Grid, coord: VoxelCoord) -> Voxel {
    match grid.get(coord) {
        Ok(voxel) => voxel,
        Err(e) => {
            log::trace!("unreadable cell {}: {}", coord, e);
            Voxel::EMPTY
        }
    }
}

/// Vertical limits of an addressable world
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightLimits {
    pub min_y: i32,
    pub max_y: i32,
}

impl Default for HeightLimits {
    fn default() -> Self {
        Self { min_y: -64, max_y: 319 }
    }
}

/// Sparse in-memory grid, used by the simulation binary and tests.
pub struct MemoryGrid {
    /// Non-empty cells
    cells: HashMap<VoxelCoord, Voxel>,
    /// Worlds that are currently loaded
    loaded: HashSet<WorldId>,
    /// Vertical addressable range shared by all worlds
    limits: HeightLimits,
    /// Cells written since the last `take_modified`
    modified: Vec<VoxelCoord>,
}

impl MemoryGrid {
    /// Create an empty grid with world 0 loaded
    pub fn new() -> Self {
        Self::with_limits(HeightLimits::default())
    }

    /// Create an empty grid with custom height limits
    pub fn with_limits(limits: HeightLimits) -> Self {
        let mut loaded = HashSet::new();
        loaded.insert(0);
        Self {
            cells: HashMap::new(),
            loaded,
            limits,
            modified: Vec::new(),
        }
    }

    /// Mark a world as loaded
    pub fn load_world(&mut self, world: WorldId) {
        self.loaded.insert(world);
    }

    /// Mark a world as unloaded; its cells become unreadable but are kept
    pub fn unload_world(&mut self, world: WorldId) {
        self.loaded.remove(&world);
    }

    /// Fill a box of cells in `world` with `voxel`
    pub fn fill(&mut self, world: WorldId, region: VoxelBox, voxel: Voxel) {
        for p in region.cells() {
            let coord = VoxelCoord::from_ivec3(world, p);
            if voxel.is_empty() {
                self.cells.remove(&coord);
            } else {
                self.cells.insert(coord, voxel);
            }
        }
    }

    /// Number of non-empty cells
    pub fn solid_count(&self) -> usize {
        self.cells.len()
    }

    /// Take cells written since the last call (clears the list)
    pub fn take_modified(&mut self) -> Vec<VoxelCoord> {
        std::mem::take(&mut self.modified)
    }

    fn check(&self, coord: VoxelCoord) -> Result<()> {
        if !self.loaded.contains(&coord.world) {
            return Err(Error::UnloadedRegion(coord));
        }
        if coord.y < self.limits.min_y || coord.y > self.limits.max_y {
            return Err(Error::OutOfBounds(coord));
        }
        Ok(())
    }
}

impl Default for MemoryGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid for MemoryGrid {
    fn get(&self, coord: VoxelCoord) -> Result<Voxel> {
        self.check(coord)?;
        Ok(self.cells.get(&coord).copied().unwrap_or(Voxel::EMPTY))
    }

    fn set(&mut self, coord: VoxelCoord, voxel: Voxel) -> Result<()> {
        self.check(coord)?;
        if voxel.is_empty() {
            self.cells.remove(&coord);
        } else {
            self.cells.insert(coord, voxel);
        }
        self.modified.push(coord);
        Ok(())
    }
}
