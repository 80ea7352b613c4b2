//! Authoritative store of broken voxels.
//!
//! Each coordinate is either intact (no record) or broken (one record,
//! usually with a pending restore). Only the tick thread mutates the ledger;
//! [`LedgerView`] clones may read it from anywhere.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::error::Error;
use crate::core::types::{ActorId, Result, Tick};
use crate::engine::host::{notify_break, notify_restore, EffectsSink};
use crate::voxel::coord::VoxelCoord;
use crate::voxel::grid::{read_or_empty, Grid};
use crate::voxel::material::FragileKind;
use crate::voxel::voxel::{Voxel, VoxelSnapshot};
use super::record::{BrokenVoxelRecord, FlushReport, RestoreOutcome};
use super::timer::{DueRestore, TaskState, TimerService};

type RecordMap = HashMap<VoxelCoord, BrokenVoxelRecord>;

/// Mutable collaborators a ledger transition touches
pub struct LedgerContext<'a> {
    pub grid: &'a mut dyn Grid,
    pub timers: &'a mut dyn TimerService,
    pub effects: &'a mut dyn EffectsSink,
}

/// A voxel about to be broken
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakRequest {
    pub coord: VoxelCoord,
    pub snapshot: VoxelSnapshot,
    pub kind: FragileKind,
    pub actor: Option<ActorId>,
    /// Restore after this many ticks; None leaves the voxel broken until flushed
    pub delay: Option<Tick>,
}

fn read_map(records: &RwLock<RecordMap>) -> RwLockReadGuard<'_, RecordMap> {
    records.read().unwrap_or_else(PoisonError::into_inner)
}

/// Ledger of broken voxels and their pending restores
#[derive(Debug, Default)]
pub struct BreakLedger {
    records: Arc<RwLock<RecordMap>>,
}

impl BreakLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordMap> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only handle sharing this ledger's records
    pub fn view(&self) -> LedgerView {
        LedgerView {
            records: Arc::clone(&self.records),
        }
    }

    pub fn count(&self) -> usize {
        read_map(&self.records).len()
    }

    pub fn is_broken(&self, coord: VoxelCoord) -> bool {
        read_map(&self.records).contains_key(&coord)
    }

    pub fn get(&self, coord: VoxelCoord) -> Option<BrokenVoxelRecord> {
        read_map(&self.records).get(&coord).copied()
    }

    /// Break a voxel: clear the cell, schedule its restore and record it.
    ///
    /// Fails with `AlreadyBroken` when a record exists. If the restore
    /// cannot be scheduled the cell is repainted immediately and the
    /// `SchedulingFailure` is returned; no record remains.
    pub fn commit(&mut self, ctx: &mut LedgerContext<'_>, request: BreakRequest, now: Tick) -> Result<()> {
        let coord = request.coord;
        if self.is_broken(coord) {
            return Err(Error::AlreadyBroken(coord));
        }

        ctx.grid.set(coord, Voxel::EMPTY)?;

        let handle = match request.delay {
            None => None,
            Some(delay) => match ctx.timers.schedule(delay, coord) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::warn!("Restoring {} immediately: {}", coord, e);
                    if let Err(repaint) = ctx.grid.set(coord, request.snapshot) {
                        log::warn!("Fail-safe repaint of {} failed: {}", coord, repaint);
                    }
                    return Err(e);
                }
            },
        };

        self.write().insert(
            coord,
            BrokenVoxelRecord {
                coord,
                snapshot: request.snapshot,
                kind: request.kind,
                broken_at: now,
                handle,
                actor: request.actor,
            },
        );
        notify_break(ctx.effects, coord);
        log::debug!("Broke {:?} at {} (restore {:?})", request.kind, coord, request.delay);
        Ok(())
    }

    /// Resolve the record at `coord`.
    ///
    /// Repaints the snapshot when the cell is still empty and otherwise
    /// leaves the cell alone. Either way the record is removed and its
    /// pending restore cancelled. Calling it again is a no-op.
    pub fn restore(&mut self, ctx: &mut LedgerContext<'_>, coord: VoxelCoord) -> RestoreOutcome {
        let Some(record) = self.write().remove(&coord) else {
            return RestoreOutcome::NotBroken;
        };
        if let Some(handle) = record.handle {
            ctx.timers.cancel(handle);
        }

        if !read_or_empty(&*ctx.grid, coord).is_empty() {
            log::debug!("Skipped repaint of {}: cell is occupied", coord);
            return RestoreOutcome::Occupied;
        }

        match ctx.grid.set(coord, record.snapshot) {
            Ok(()) => {
                notify_restore(ctx.effects, coord);
                log::debug!("Restored {:?} at {}", record.kind, coord);
                RestoreOutcome::Repainted
            }
            Err(e) => {
                log::warn!("Could not repaint {}: {}", coord, e);
                RestoreOutcome::Unwritable
            }
        }
    }

    /// Handle a restore that came due on the timer service.
    ///
    /// Only acts when the task is the one the current record is waiting on.
    pub fn fire(&mut self, ctx: &mut LedgerContext<'_>, due: DueRestore) -> RestoreOutcome {
        match self.get(due.coord) {
            None => RestoreOutcome::NotBroken,
            Some(record) if record.handle != Some(due.handle) => {
                log::trace!("Ignoring stale restore task {:?} for {}", due.handle, due.coord);
                RestoreOutcome::Stale
            }
            Some(_) => self.restore(ctx, due.coord),
        }
    }

    /// Restore every record now and cancel all their pending timers.
    ///
    /// Leaves the ledger empty.
    pub fn force_restore_all(&mut self, ctx: &mut LedgerContext<'_>) -> FlushReport {
        let mut coords: Vec<VoxelCoord> = read_map(&self.records).keys().copied().collect();
        coords.sort();

        let mut report = FlushReport::default();
        for coord in coords {
            let pending = self
                .get(coord)
                .and_then(|r| r.handle)
                .is_some_and(|h| ctx.timers.state(h) == Some(TaskState::Pending));
            if pending {
                report.cancelled += 1;
            }

            match self.restore(ctx, coord) {
                RestoreOutcome::Repainted => report.repainted += 1,
                RestoreOutcome::Occupied | RestoreOutcome::Unwritable => report.occupied += 1,
                RestoreOutcome::NotBroken | RestoreOutcome::Stale => continue,
            }
            report.restored += 1;
        }

        log::info!(
            "Flushed {} broken voxels ({} repainted, {} timers cancelled)",
            report.restored,
            report.repainted,
            report.cancelled
        );
        report
    }
}

/// Cloneable read-only view of a [`BreakLedger`], safe to use off the tick thread
#[derive(Clone, Debug)]
pub struct LedgerView {
    records: Arc<RwLock<RecordMap>>,
}

impl LedgerView {
    pub fn count(&self) -> usize {
        read_map(&self.records).len()
    }

    pub fn is_broken(&self, coord: VoxelCoord) -> bool {
        read_map(&self.records).contains_key(&coord)
    }

    pub fn get(&self, coord: VoxelCoord) -> Option<BrokenVoxelRecord> {
        read_map(&self.records).get(&coord).copied()
    }

    /// Every current record, ordered by coordinate
    pub fn records(&self) -> Vec<BrokenVoxelRecord> {
        let mut records: Vec<_> = read_map(&self.records).values().copied().collect();
        records.sort_by_key(|r| r.coord);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::{EffectEvent, NoEffects, RecordingEffects};
    use crate::ledger::timer::TickScheduler;
    use crate::voxel::grid::MemoryGrid;
    use crate::voxel::material::palette;

    fn request(x: i32, delay: Option<Tick>) -> BreakRequest {
        BreakRequest {
            coord: VoxelCoord::new(0, x, 0, 0),
            snapshot: Voxel::new(palette::GLASS_PANE, 0b1010),
            kind: FragileKind::Pane,
            actor: Some(1),
            delay,
        }
    }

    fn setup(cells: i32) -> (MemoryGrid, TickScheduler) {
        let mut grid = MemoryGrid::new();
        for x in 0..cells {
            grid.set(VoxelCoord::new(0, x, 0, 0), Voxel::new(palette::GLASS_PANE, 0b1010)).unwrap();
        }
        (grid, TickScheduler::new(1024))
    }

    #[test]
    fn test_commit_clears_and_schedules() {
        let (mut grid, mut timers) = setup(1);
        let mut effects = RecordingEffects::new();
        let mut ledger = BreakLedger::new();
        let req = request(0, Some(30));
        {
            let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut effects };
            ledger.commit(&mut ctx, req, 0).unwrap();
        }
        assert!(grid.get(req.coord).unwrap().is_empty());
        assert_eq!(timers.pending(), 1);
        assert_eq!(ledger.count(), 1);
        assert_eq!(effects.take(), vec![EffectEvent::Break { coord: req.coord }]);
    }

    #[test]
    fn test_second_commit_rejected() {
        let (mut grid, mut timers) = setup(1);
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        ledger.commit(&mut ctx, request(0, Some(30)), 0).unwrap();
        let err = ledger.commit(&mut ctx, request(0, Some(30)), 1).unwrap_err();
        assert!(matches!(err, Error::AlreadyBroken(_)));
        assert_eq!(ledger.count(), 1);
        assert_eq!(ctx.timers.pending(), 1);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let (mut grid, mut timers) = setup(1);
        let req = request(0, Some(5));
        let before = grid.get(req.coord).unwrap();
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        ledger.commit(&mut ctx, req, 0).unwrap();
        assert_eq!(ledger.restore(&mut ctx, req.coord), RestoreOutcome::Repainted);
        assert_eq!(ledger.restore(&mut ctx, req.coord), RestoreOutcome::NotBroken);
        assert_eq!(grid.get(req.coord).unwrap(), before);
    }

    #[test]
    fn test_occupied_cell_skips_repaint() {
        let (mut grid, mut timers) = setup(1);
        let req = request(0, Some(30));
        let mut effects = RecordingEffects::new();
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut effects };
        ledger.commit(&mut ctx, req, 0).unwrap();

        ctx.grid.set(req.coord, Voxel::of(1)).unwrap();
        let due = ctx.timers.poll_due(30);
        assert_eq!(due.len(), 1);
        assert_eq!(ledger.fire(&mut ctx, due[0]), RestoreOutcome::Occupied);
        assert_eq!(ledger.count(), 0);
        assert_eq!(grid.get(req.coord).unwrap(), Voxel::of(1));
        assert_eq!(effects.take(), vec![EffectEvent::Break { coord: req.coord }]);
    }

    #[test]
    fn test_stale_task_ignored() {
        let (mut grid, mut timers) = setup(1);
        let req = request(0, Some(10));
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        ledger.commit(&mut ctx, req, 0).unwrap();
        let old = ledger.get(req.coord).and_then(|r| r.handle).unwrap();

        // Restored early and broken again: the first task must not restore the new break
        ledger.restore(&mut ctx, req.coord);
        ctx.grid.set(req.coord, Voxel::of(palette::GLASS_PANE)).unwrap();
        ledger.commit(&mut ctx, req, 1).unwrap();

        let stale = DueRestore { handle: old, coord: req.coord, due: 10 };
        assert_eq!(ledger.fire(&mut ctx, stale), RestoreOutcome::Stale);
        assert!(ledger.is_broken(req.coord));
    }

    #[test]
    fn test_force_restore_all() {
        let (mut grid, mut timers) = setup(12);
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        for x in 0..12 {
            ledger.commit(&mut ctx, request(x, Some(100 + x as Tick)), 0).unwrap();
        }
        let report = ledger.force_restore_all(&mut ctx);
        assert_eq!(report.restored, 12);
        assert_eq!(report.repainted, 12);
        assert_eq!(report.cancelled, 12);
        assert_eq!(ledger.count(), 0);
        assert_eq!(ctx.timers.pending(), 0);
        assert!(ctx.timers.poll_due(1000).is_empty());
    }

    #[test]
    fn test_scheduling_failure_restores_immediately() {
        let (mut grid, _) = setup(2);
        let mut timers = TickScheduler::new(1);
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        ledger.commit(&mut ctx, request(0, Some(5)), 0).unwrap();

        let req = request(1, Some(5));
        let err = ledger.commit(&mut ctx, req, 0).unwrap_err();
        assert!(matches!(err, Error::SchedulingFailure(_)));
        assert!(!ledger.is_broken(req.coord));
        assert_eq!(grid.get(req.coord).unwrap(), req.snapshot);
    }

    #[test]
    fn test_no_delay_means_no_timer() {
        let (mut grid, mut timers) = setup(1);
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        ledger.commit(&mut ctx, request(0, None), 0).unwrap();
        assert_eq!(ledger.get(VoxelCoord::new(0, 0, 0, 0)).unwrap().handle, None);
        assert_eq!(ctx.timers.pending(), 0);

        let report = ledger.force_restore_all(&mut ctx);
        assert_eq!(report.restored, 1);
        assert_eq!(report.cancelled, 0);
    }

    #[test]
    fn test_view_reads_from_other_thread() {
        let (mut grid, mut timers) = setup(3);
        let mut ledger = BreakLedger::new();
        let mut ctx = LedgerContext { grid: &mut grid, timers: &mut timers, effects: &mut NoEffects };
        for x in 0..3 {
            ledger.commit(&mut ctx, request(x, Some(20)), 0).unwrap();
        }

        let view = ledger.view();
        let (count, broken) = std::thread::spawn(move || {
            (view.count(), view.is_broken(VoxelCoord::new(0, 1, 0, 0)))
        })
        .join()
        .unwrap();
        assert_eq!(count, 3);
        assert!(broken);
        assert_eq!(ledger.view().records().len(), 3);
    }
}
