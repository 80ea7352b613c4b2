//! Connected-structure resolution by flood fill

use std::collections::{HashSet, VecDeque};

use crate::ledger::BrokenIndex;
use crate::voxel::coord::VoxelCoord;
use crate::voxel::grid::{read_or_empty, Grid};
use crate::voxel::material::{FragileKind, MaterialRegistry};
use super::thickness::ThicknessAnalyzer;

/// Default upper bound on structure size
pub const DEFAULT_STRUCTURE_CAP: usize = 64;

/// Result of a flood fill
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    pub kind: FragileKind,
    /// Member cells in breadth-first order from the origin
    pub cells: Vec<VoxelCoord>,
    /// The fill stopped at the cap before exhausting the structure
    pub truncated: bool,
}

impl Structure {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: &VoxelCoord) -> bool {
        self.cells.contains(coord)
    }
}

/// Breadth-first flood fill over face-adjacent, same-kind, single-layer voxels
pub struct StructureResolver<'a> {
    registry: &'a MaterialRegistry,
    grid: &'a dyn Grid,
    broken: &'a dyn BrokenIndex,
}

impl<'a> StructureResolver<'a> {
    pub fn new(registry: &'a MaterialRegistry, grid: &'a dyn Grid, broken: &'a dyn BrokenIndex) -> Self {
        Self { registry, grid, broken }
    }

    /// Whether `coord` may join a structure of `kind`
    fn admits(&self, analyzer: &ThicknessAnalyzer<'_>, coord: VoxelCoord, kind: FragileKind) -> bool {
        let same_kind = self
            .registry
            .classify(read_or_empty(self.grid, coord).material_id)
            .is_some_and(|k| k.merges_with(&kind));
        same_kind && !self.broken.is_broken(coord) && analyzer.is_single_layer(coord)
    }

    /// Collect the structure containing `origin`, at most `cap` cells.
    ///
    /// An origin that does not itself qualify yields an empty structure.
    /// Hitting the cap is a normal outcome, reported through `truncated`.
    pub fn resolve(&self, origin: VoxelCoord, kind: FragileKind, cap: usize) -> Structure {
        let analyzer = ThicknessAnalyzer::new(self.registry, self.grid);
        let mut structure = Structure {
            kind,
            cells: Vec::new(),
            truncated: false,
        };

        if cap == 0 || !self.admits(&analyzer, origin, kind) {
            return structure;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(origin);
        queue.push_back(origin);

        while let Some(current) = queue.pop_front() {
            structure.cells.push(current);
            if structure.cells.len() >= cap {
                structure.truncated = !queue.is_empty() || self.has_unvisited(&analyzer, current, kind, &visited);
                break;
            }

            for neighbor in current.face_neighbors() {
                if visited.contains(&neighbor) {
                    continue;
                }
                visited.insert(neighbor);
                if self.admits(&analyzer, neighbor, kind) {
                    queue.push_back(neighbor);
                }
            }
        }

        log::trace!(
            "Resolved {:?} structure of {} cells at {}{}",
            kind,
            structure.cells.len(),
            origin,
            if structure.truncated { " (capped)" } else { "" }
        );
        structure
    }

    fn has_unvisited(
        &self,
        analyzer: &ThicknessAnalyzer<'_>,
        at: VoxelCoord,
        kind: FragileKind,
        visited: &HashSet<VoxelCoord>,
    ) -> bool {
        at.face_neighbors()
            .any(|n| !visited.contains(&n) && self.admits(analyzer, n, kind))
    }
}
