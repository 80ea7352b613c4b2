//! The trigger pipeline.
//!
//! Every break goes through one ordered path:
//!
//! 1. classify the event and check its feature toggle
//! 2. speed gate and cooldown peek (movement only)
//! 3. collision scan for a candidate
//! 4. fragility, thickness and region checks on the candidate
//! 5. structure flood fill (impacts) or local area selection (movement)
//! 6. commit each target to the ledger
//!
//! Restores come due on [`Engine::tick`].

use glam::IVec3;

use crate::core::error::Error;
use crate::core::time::TickClock;
use crate::core::types::{ActorId, Result, Tick};
use crate::fragile::config::{BreakMode, Feature, ShatterConfig, MAX_TRIGGER_RADIUS};
use crate::fragile::scan::CollisionScanner;
use crate::fragile::structure::StructureResolver;
use crate::fragile::thickness::ThicknessAnalyzer;
use crate::fragile::trigger::{classify_motion, ActorMotion, Impact, Punch, TriggerKind};
use crate::ledger::{
    BreakLedger, BreakRequest, FlushReport, LedgerContext, LedgerView, TickScheduler, TimerService,
};
use crate::math::VoxelBox;
use crate::voxel::coord::VoxelCoord;
use crate::voxel::grid::Grid;
use crate::voxel::material::{FragileKind, MaterialRegistry};
use crate::voxel::voxel::Voxel;
use super::host::{AllowAll, EffectsSink, NoEffects, RegionAuthority};
use super::limiter::RateLimiter;
use super::outcome::{BreakOutcome, EngineStatus, Refusal};
use super::stats::BreakStats;

/// A voxel selected for breaking, captured before any cell is cleared
#[derive(Clone, Copy, Debug)]
struct Target {
    coord: VoxelCoord,
    voxel: Voxel,
    kind: FragileKind,
}

/// Fragile-structure engine: owns the ledger and drives every trigger
pub struct Engine {
    grid: Box<dyn Grid>,
    region: Box<dyn RegionAuthority>,
    effects: Box<dyn EffectsSink>,
    timers: Box<dyn TimerService>,
    config: ShatterConfig,
    registry: MaterialRegistry,
    ledger: BreakLedger,
    limiter: RateLimiter,
    stats: BreakStats,
    clock: TickClock,
}

impl Engine {
    /// Create an engine over `grid` with permissive regions, no effects and
    /// an in-process scheduler
    pub fn new(config: ShatterConfig, grid: impl Grid + 'static) -> Result<Self> {
        config.validate()?;
        let registry = config.registry();
        let timers = TickScheduler::new(config.scheduler_capacity);
        log::info!(
            "Shatter engine started: {} fragile materials, {} ms ticks",
            registry.len(),
            config.tick_ms
        );

        Ok(Self {
            grid: Box::new(grid),
            region: Box::new(AllowAll),
            effects: Box::new(NoEffects),
            timers: Box::new(timers),
            clock: config.clock(),
            config,
            registry,
            ledger: BreakLedger::new(),
            limiter: RateLimiter::new(),
            stats: BreakStats::new(),
        })
    }

    pub fn with_region_authority(mut self, region: impl RegionAuthority + 'static) -> Self {
        self.region = Box::new(region);
        self
    }

    pub fn with_effects(mut self, effects: impl EffectsSink + 'static) -> Self {
        self.effects = Box::new(effects);
        self
    }

    /// Replace the timer service. Only valid before anything was broken.
    pub fn with_timers(mut self, timers: impl TimerService + 'static) -> Self {
        self.timers = Box::new(timers);
        self
    }

    // ---- Triggers ----

    /// Evaluate one tick of actor motion
    pub fn on_movement(&mut self, motion: &ActorMotion) -> BreakOutcome {
        self.limiter.record_position(motion.actor, motion.to);

        let Some(trigger) = classify_motion(motion, &self.config.movement, &self.config.triggers) else {
            return BreakOutcome::NoTrigger;
        };
        let feature = trigger.feature();
        if !self.config.features.get(feature) {
            return BreakOutcome::Disabled { feature };
        }

        let now_ms = self.clock.now_ms();
        let cooldown = self.config.movement.cooldown_ms;
        if !self.limiter.would_allow(motion.actor, now_ms, cooldown) {
            return BreakOutcome::CoolingDown;
        }

        let neighborhood = self.config.triggers.profile(trigger).neighborhood;
        let candidate = CollisionScanner::new(&self.registry, self.grid.as_ref(), &self.config.path)
            .scan_motion(motion.world, motion.from, motion.to, neighborhood);
        let Some(origin) = candidate else {
            return BreakOutcome::Miss;
        };

        let outcome = self.break_at(origin, trigger, Some(motion.actor));
        if outcome.is_broken() {
            self.limiter.allow(motion.actor, now_ms, cooldown);
        }
        outcome
    }

    /// Evaluate motion from a host that only reports where actors are now.
    ///
    /// `motion.from` is replaced by the actor's last recorded position. The
    /// first report for an actor has nothing to compare against and only
    /// records the position.
    pub fn on_position(&mut self, mut motion: ActorMotion) -> BreakOutcome {
        let Some(last) = self.limiter.last_position(motion.actor) else {
            self.limiter.record_position(motion.actor, motion.to);
            return BreakOutcome::NoTrigger;
        };
        motion.from = last;
        self.on_movement(&motion)
    }

    /// Evaluate a projectile hitting a voxel
    pub fn on_impact(&mut self, impact: &Impact) -> BreakOutcome {
        let trigger = TriggerKind::Projectile(impact.kind);
        if !self.config.features.get(Feature::Projectile) {
            return BreakOutcome::Disabled { feature: Feature::Projectile };
        }
        self.break_at(impact.target, trigger, impact.actor)
    }

    /// Evaluate an actor punching a voxel. Breaks that voxel alone under
    /// the default profile, with no cooldown.
    pub fn on_punch(&mut self, punch: &Punch) -> BreakOutcome {
        if !self.config.features.get(Feature::Punch) {
            return BreakOutcome::Disabled { feature: Feature::Punch };
        }
        self.break_at(punch.target, TriggerKind::Punch, Some(punch.actor))
    }

    /// Confirm a candidate, expand it and commit the result
    fn break_at(&mut self, origin: VoxelCoord, trigger: TriggerKind, actor: Option<ActorId>) -> BreakOutcome {
        let (targets, truncated) = match self.select_targets(origin, trigger, actor) {
            Ok(selection) => selection,
            Err(reason) => {
                log::trace!("Refused {:?} at {}: {:?}", trigger, origin, reason);
                return BreakOutcome::Refused { origin, reason };
            }
        };

        let now = self.clock.now();
        let regenerate = self.config.features.regeneration;
        let mut committed = Vec::with_capacity(targets.len());
        let mut last_refusal = Refusal::AlreadyBroken;

        let mut ctx = LedgerContext {
            grid: self.grid.as_mut(),
            timers: self.timers.as_mut(),
            effects: self.effects.as_mut(),
        };
        for target in targets {
            let request = BreakRequest {
                coord: target.coord,
                snapshot: target.voxel,
                kind: target.kind,
                actor,
                delay: regenerate.then(|| self.registry.regen_delay(target.kind)),
            };
            match self.ledger.commit(&mut ctx, request, now) {
                Ok(()) => committed.push(target.coord),
                Err(e) => {
                    log::trace!("Skipped {}: {}", target.coord, e);
                    last_refusal = refusal_for(&e);
                }
            }
        }

        if committed.is_empty() {
            return BreakOutcome::Refused { origin, reason: last_refusal };
        }

        self.stats.record(actor, committed.len() as u64);
        log::debug!("{:?} broke {} voxels from {}", trigger, committed.len(), origin);
        BreakOutcome::Broken {
            trigger,
            origin,
            coords: committed,
            truncated,
        }
    }

    /// Everything a confirmed candidate would break, read before any cell changes
    fn select_targets(
        &self,
        origin: VoxelCoord,
        trigger: TriggerKind,
        actor: Option<ActorId>,
    ) -> std::result::Result<(Vec<Target>, bool), Refusal> {
        let grid = self.grid.as_ref();
        let voxel = grid.get(origin).map_err(|_| Refusal::Unreadable)?;
        let kind = self.registry.classify(voxel.material_id).ok_or(Refusal::NotFragile)?;
        if self.ledger.is_broken(origin) {
            return Err(Refusal::AlreadyBroken);
        }
        let analyzer = ThicknessAnalyzer::new(&self.registry, grid);
        if !analyzer.is_single_layer(origin) {
            return Err(Refusal::Thick);
        }
        if !self.region.can_alter(origin, actor) {
            return Err(Refusal::RegionDenied);
        }

        let profile = self.config.triggers.profile(trigger);
        let (coords, truncated) = match profile.mode {
            BreakMode::Structure => {
                let cap = impact_cap(self.config.structure_cap, profile.radius);
                let structure = StructureResolver::new(&self.registry, grid, &self.ledger)
                    .resolve(origin, kind, cap);
                (structure.cells, structure.truncated)
            }
            BreakMode::Area => (self.area_cells(&analyzer, origin, profile.radius), false),
        };

        // The origin passed every check above; the rest are checked here
        let targets = coords
            .into_iter()
            .filter(|&c| c == origin || self.region.can_alter(c, actor))
            .filter_map(|coord| {
                let voxel = grid.get(coord).ok()?;
                let kind = self.registry.classify(voxel.material_id)?;
                Some(Target { coord, voxel, kind })
            })
            .collect();
        Ok((targets, truncated))
    }

    /// Breakable voxels within Euclidean distance `radius` of `origin`, origin first
    fn area_cells(&self, analyzer: &ThicknessAnalyzer<'_>, origin: VoxelCoord, radius: i32) -> Vec<VoxelCoord> {
        let radius = radius.clamp(0, MAX_TRIGGER_RADIUS);
        let r2 = radius * radius;
        let mut cells = vec![origin];
        for p in VoxelBox::around(origin.pos(), radius).cells() {
            let d = p - origin.pos();
            if d == IVec3::ZERO || d.length_squared() > r2 {
                continue;
            }
            let coord = VoxelCoord::from_ivec3(origin.world, p);
            if analyzer.is_fragile_at(coord) && !self.ledger.is_broken(coord) && analyzer.is_single_layer(coord) {
                cells.push(coord);
            }
        }
        cells
    }

    // ---- Time ----

    /// Advance one tick and run every restore that came due.
    ///
    /// Returns the number of records resolved.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.advance();
        let due = self.timers.poll_due(now);
        if due.is_empty() {
            return 0;
        }

        let mut ctx = LedgerContext {
            grid: self.grid.as_mut(),
            timers: self.timers.as_mut(),
            effects: self.effects.as_mut(),
        };
        let mut resolved = 0;
        for task in due {
            if self.ledger.fire(&mut ctx, task).resolved() {
                resolved += 1;
            }
        }
        log::trace!("Tick {}: {} restores", now, resolved);
        resolved
    }

    /// Run `ticks` ticks, returning the total records resolved
    pub fn run_ticks(&mut self, ticks: Tick) -> usize {
        (0..ticks).map(|_| self.tick()).sum()
    }

    // ---- Administration ----

    /// Restore every broken voxel now
    pub fn force_restore_all(&mut self) -> FlushReport {
        let mut ctx = LedgerContext {
            grid: self.grid.as_mut(),
            timers: self.timers.as_mut(),
            effects: self.effects.as_mut(),
        };
        self.ledger.force_restore_all(&mut ctx)
    }

    /// Flush all records before the host tears the engine down
    pub fn shutdown(&mut self) -> FlushReport {
        let report = self.force_restore_all();
        log::info!(
            "Shatter engine shut down at tick {}: {} voxels restored",
            self.clock.now(),
            report.restored
        );
        report
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        self.config.features.set(feature, enabled);
        log::info!("{:?} {}", feature, if enabled { "enabled" } else { "disabled" });
    }

    /// Flip a feature, returning its new state
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        let enabled = !self.config.features.get(feature);
        self.set_feature(feature, enabled);
        enabled
    }

    pub fn feature_enabled(&self, feature: Feature) -> bool {
        self.config.features.get(feature)
    }

    /// Swap in a new configuration.
    ///
    /// Existing records and pending restores keep their schedule; new
    /// breaks use the new delays, radii and thresholds.
    pub fn reload(&mut self, config: ShatterConfig) -> Result<()> {
        config.validate()?;
        if config.tick_ms != self.config.tick_ms {
            let mut clock = config.clock();
            clock.advance_by(self.clock.now());
            self.clock = clock;
        }
        if config.scheduler_capacity != self.config.scheduler_capacity {
            if self.timers.set_capacity(config.scheduler_capacity) {
                log::info!("Restore capacity now {}", config.scheduler_capacity);
            } else {
                log::warn!("Timer service ignores scheduler_capacity; keeping its own limit");
            }
        }
        self.registry = config.registry();
        self.config = config;
        log::info!("Shatter config reloaded: {} fragile materials", self.registry.len());
        Ok(())
    }

    /// Drop the movement state of an actor that left
    pub fn forget_actor(&mut self, actor: ActorId) {
        if self.limiter.forget(actor) {
            log::trace!("Forgot actor {}", actor);
        }
    }

    // ---- Queries ----

    pub fn count(&self) -> usize {
        self.ledger.count()
    }

    pub fn is_broken(&self, coord: VoxelCoord) -> bool {
        self.ledger.is_broken(coord)
    }

    /// Read-only ledger handle for other threads
    pub fn view(&self) -> LedgerView {
        self.ledger.view()
    }

    pub fn ledger(&self) -> &BreakLedger {
        &self.ledger
    }

    pub fn pending_restores(&self) -> usize {
        self.timers.pending()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            tick: self.clock.now(),
            features: self.config.features,
            broken: self.ledger.count(),
            pending_restores: self.timers.pending(),
            total_breaks: self.stats.total(),
            tracked_actors: self.limiter.len(),
        }
    }

    pub fn stats(&self) -> &BreakStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut BreakStats {
        &mut self.stats
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn config(&self) -> &ShatterConfig {
        &self.config
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn grid(&self) -> &dyn Grid {
        self.grid.as_ref()
    }

    /// Direct grid access for host-side edits between ticks
    pub fn grid_mut(&mut self) -> &mut dyn Grid {
        self.grid.as_mut()
    }
}

/// Flood-fill cap for an impact of `radius`
pub fn impact_cap(structure_cap: usize, radius: i32) -> usize {
    let side = (radius.max(0) as usize).saturating_mul(2).saturating_add(1);
    structure_cap.min(side.saturating_mul(side).saturating_mul(side))
}

fn refusal_for(error: &Error) -> Refusal {
    match error {
        Error::AlreadyBroken(_) => Refusal::AlreadyBroken,
        Error::RegionDenied(_) => Refusal::RegionDenied,
        Error::SchedulingFailure(_) => Refusal::SchedulingFailure,
        _ => Refusal::Unreadable,
    }
}
