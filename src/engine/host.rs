//! Collaborators supplied by the host environment

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::core::types::{ActorId, Result};
use crate::voxel::coord::VoxelCoord;

/// External permission gate for world alteration
pub trait RegionAuthority {
    fn can_alter(&self, coord: VoxelCoord, actor: Option<ActorId>) -> bool;
}

/// Permits every alteration
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl RegionAuthority for AllowAll {
    fn can_alter(&self, _coord: VoxelCoord, _actor: Option<ActorId>) -> bool {
        true
    }
}

impl<F> RegionAuthority for F
where
    F: Fn(VoxelCoord, Option<ActorId>) -> bool,
{
    fn can_alter(&self, coord: VoxelCoord, actor: Option<ActorId>) -> bool {
        self(coord, actor)
    }
}

/// Visual and audio feedback. Best effort: the engine logs and ignores errors.
pub trait EffectsSink {
    fn on_break(&mut self, coord: VoxelCoord) -> Result<()>;
    fn on_restore(&mut self, coord: VoxelCoord) -> Result<()>;
}

/// Discards all effects
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl EffectsSink for NoEffects {
    fn on_break(&mut self, _coord: VoxelCoord) -> Result<()> {
        Ok(())
    }

    fn on_restore(&mut self, _coord: VoxelCoord) -> Result<()> {
        Ok(())
    }
}

/// One effect notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectEvent {
    Break { coord: VoxelCoord },
    Restore { coord: VoxelCoord },
}

/// Keeps every notification in a shared log.
///
/// Clones share the same log, so a host can keep one clone while the
/// engine owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingEffects {
    events: Arc<Mutex<Vec<EffectEvent>>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EffectEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<EffectEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, event: EffectEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl EffectsSink for RecordingEffects {
    fn on_break(&mut self, coord: VoxelCoord) -> Result<()> {
        self.push(EffectEvent::Break { coord });
        Ok(())
    }

    fn on_restore(&mut self, coord: VoxelCoord) -> Result<()> {
        self.push(EffectEvent::Restore { coord });
        Ok(())
    }
}

/// Deliver a break notification, swallowing failures
pub(crate) fn notify_break(effects: &mut dyn EffectsSink, coord: VoxelCoord) {
    if let Err(e) = effects.on_break(coord) {
        log::debug!("Break effect at {} failed: {}", coord, e);
    }
}

/// Deliver a restore notification, swallowing failures
pub(crate) fn notify_restore(effects: &mut dyn EffectsSink, coord: VoxelCoord) {
    if let Err(e) = effects.on_restore(coord) {
        log::debug!("Restore effect at {} failed: {}", coord, e);
    }
}
