//! Headless shatter simulation with the admin server attached.
//!
//! Usage: cargo run --release --bin shatter_sim -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   JSON engine configuration (default: built-in defaults)
//!   --ticks <N>       Ticks to simulate (default: 1200, one minute)
//!   --port <PORT>     Admin server port (default: 9743)
//!   --no-admin        Do not start the admin server
//!   --realtime        Sleep one tick length between ticks
//!   --verbose         Log every committed break and restore
//!
//! The scripted scene holds a glass window, a red stained pane, a thick
//! glass block and a tinted skylight. A few actors run, sprint, fall and
//! glide through them while arrows fly and one actor punches; every broken
//! voxel regenerates on its own schedule.

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use glam::{IVec3, Vec3};

use shatter::core::logging;
use shatter::engine::{ActorStats, EngineStatus, RecordingEffects};
use shatter::fragile::{ActorMotion, Feature, Impact, ProjectileKind, Punch};
use shatter::ledger::LedgerView;
use shatter::math::VoxelBox;
use shatter::voxel::{palette, GlassColor, Grid, MemoryGrid, Voxel, VoxelCoord};
use shatter::{BreakOutcome, Engine, ShatterConfig};
use shatter_admin::{
    AdminCommand, AdminHandler, AdminResponse, AdminServer, BreakerEntry, FeatureState, ResponseData,
};

const STONE: u16 = 1;

/// Mutations requested over the admin connection, applied on the tick thread
#[derive(Debug)]
enum AdminRequest {
    RestoreAll,
    Toggle(Feature),
    Reload(Option<PathBuf>),
    ResetStats(Option<u64>),
}

/// State shared between the tick thread and the admin server
#[derive(Default)]
struct SharedAdminState {
    status: Option<EngineStatus>,
    breakers: Vec<ActorStats>,
    requests: Vec<AdminRequest>,
}

struct SimAdminHandler {
    state: Arc<StdMutex<SharedAdminState>>,
    view: LedgerView,
}

impl SimAdminHandler {
    fn queue(&self, request: AdminRequest) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .push(request);
    }
}

impl AdminHandler for SimAdminHandler {
    fn handle_command(&mut self, cmd: AdminCommand) -> AdminResponse {
        match cmd {
            AdminCommand::Ping => AdminResponse::pong(),

            AdminCommand::Status => {
                let s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                match &s.status {
                    Some(status) => AdminResponse::ok(ResponseData::EngineStatus {
                        tick: status.tick,
                        // Read live rather than from the last published snapshot
                        broken: self.view.count(),
                        pending_restores: status.pending_restores,
                        total_breaks: status.total_breaks,
                        tracked_actors: status.tracked_actors,
                        features: Feature::ALL
                            .iter()
                            .map(|f| FeatureState {
                                name: f.name().to_string(),
                                enabled: status.features.get(*f),
                            })
                            .collect(),
                    }),
                    None => AdminResponse::error("Simulation has not ticked yet"),
                }
            }

            AdminCommand::IsBroken { world, x, y, z } => {
                let record = self.view.get(VoxelCoord::new(world, x, y, z));
                AdminResponse::ok(ResponseData::VoxelState {
                    world,
                    x,
                    y,
                    z,
                    broken: record.is_some(),
                    broken_at: record.map(|r| r.broken_at),
                })
            }

            AdminCommand::RestoreAll => {
                self.queue(AdminRequest::RestoreAll);
                AdminResponse::queued(format!("restore {} broken voxels", self.view.count()))
            }

            AdminCommand::Toggle { feature } => match Feature::from_name(&feature) {
                Some(f) => {
                    self.queue(AdminRequest::Toggle(f));
                    AdminResponse::queued(format!("toggle {}", f.name()))
                }
                None => AdminResponse::error(format!("Unknown feature: {}", feature)),
            },

            AdminCommand::Reload { path } => {
                self.queue(AdminRequest::Reload(path.map(PathBuf::from)));
                AdminResponse::queued("reload configuration")
            }

            AdminCommand::Stats { actor } => {
                let s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                let breaks = s
                    .breakers
                    .iter()
                    .find(|b| b.actor == actor)
                    .map_or(0, |b| b.breaks);
                AdminResponse::ok(ResponseData::ActorBreaks { actor, breaks })
            }

            AdminCommand::TopBreakers { limit } => {
                let s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                let entries = s
                    .breakers
                    .iter()
                    .take(limit)
                    .map(|b| BreakerEntry { actor: b.actor, breaks: b.breaks })
                    .collect();
                AdminResponse::ok(ResponseData::TopBreakers { entries })
            }

            AdminCommand::ResetStats { actor } => {
                self.queue(AdminRequest::ResetStats(actor));
                match actor {
                    Some(actor) => AdminResponse::queued(format!("reset statistics for actor {}", actor)),
                    None => AdminResponse::queued("reset statistics"),
                }
            }
        }
    }
}

/// One scripted host event
enum Action {
    Move(ActorMotion),
    Impact(Impact),
    Punch(Punch),
    Place(VoxelCoord, Voxel),
    Leave(u64),
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verbose") {
        logging::init_with("info,shatter=debug");
    } else {
        logging::init();
    }

    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let ticks = parse_u64_arg(&args, "--ticks").unwrap_or(1200);
    let port = parse_u16_arg(&args, "--port").unwrap_or(shatter_admin::DEFAULT_PORT);
    let admin = !args.iter().any(|a| a == "--no-admin");
    let realtime = args.iter().any(|a| a == "--realtime");

    let config = match &config_path {
        Some(path) => match ShatterConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ShatterConfig::default(),
    };

    let effects = RecordingEffects::new();
    let mut engine = match Engine::new(config, build_scene()) {
        Ok(engine) => engine.with_effects(effects.clone()),
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== Shatter Simulation ===");
    println!("Ticks:  {} ({} ms each)", ticks, engine.config().tick_ms);
    println!("Admin:  {}", if admin { format!("127.0.0.1:{}", port) } else { "off".into() });
    println!();

    let shared = Arc::new(StdMutex::new(SharedAdminState::default()));
    if admin {
        start_admin_server(shared.clone(), engine.view(), port);
    }

    let script = build_script();
    let mut next_event = 0;
    for _ in 0..ticks {
        apply_admin_requests(&mut engine, &shared, config_path.as_ref());

        let now = engine.clock().now();
        while next_event < script.len() && script[next_event].0 <= now {
            run_action(&mut engine, &script[next_event].1);
            next_event += 1;
        }

        engine.tick();
        publish(&engine, &shared);

        if realtime {
            std::thread::sleep(Duration::from_millis(engine.config().tick_ms));
        }
    }

    let status = engine.status();
    let report = engine.shutdown();
    let events = effects.take();

    println!();
    println!("Ticks simulated:     {}", status.tick);
    println!("Voxels broken:       {}", status.total_breaks);
    println!("Still broken at end: {}", status.broken);
    println!("Restored at shutdown: {} ({} repainted)", report.restored, report.repainted);
    println!("Effect events:       {}", events.len());
    for entry in engine.stats().top_breakers(5) {
        println!("  actor {:>3}: {} voxels", entry.actor, entry.breaks);
    }
}

/// Scene: window, stained pane, thick block and skylight on a stone floor
fn build_scene() -> MemoryGrid {
    let mut grid = MemoryGrid::new();
    let stone = Voxel::of(STONE);

    grid.fill(0, VoxelBox::new(IVec3::new(-20, -1, -20), IVec3::new(40, -1, 20)), stone);
    // 5 wide, 3 high window in the x=10 wall
    grid.fill(0, VoxelBox::new(IVec3::new(10, 0, -4), IVec3::new(10, 3, 4)), stone);
    grid.fill(0, VoxelBox::new(IVec3::new(10, 0, -2), IVec3::new(10, 2, 2)), Voxel::of(palette::GLASS));
    // Red stained pane standing free, state bits carry its facing
    let red = Voxel::new(palette::stained_pane(GlassColor::Red), 0b0101);
    grid.fill(0, VoxelBox::new(IVec3::new(20, 0, 0), IVec3::new(20, 3, 3)), red);
    // Two-layer block that must never break
    grid.fill(0, VoxelBox::new(IVec3::new(25, 0, 0), IVec3::new(27, 2, 1)), Voxel::of(palette::GLASS));
    // Tinted skylight over a pit
    grid.fill(0, VoxelBox::new(IVec3::new(30, 5, -2), IVec3::new(34, 5, 2)), Voxel::of(palette::TINTED_GLASS));

    log::info!("Scene built with {} solid voxels", grid.solid_count());
    grid
}

fn build_script() -> Vec<(u64, Action)> {
    let mut script = Vec::new();

    // Actor 1 runs through the window
    for i in 0..12u64 {
        let x = 6.0 + i as f32 * 0.4;
        script.push((20 + i, Action::Move(ActorMotion::walk(1, 0, Vec3::new(x, 0.0, 0.5), Vec3::new(x + 0.4, 0.0, 0.5)))));
    }

    // Actor 2 sprints with a speed boost at the same window a moment later
    for i in 0..8u64 {
        let x = 7.0 + i as f32 * 0.5;
        let mut motion = ActorMotion::walk(2, 0, Vec3::new(x, 0.0, -1.5), Vec3::new(x + 0.5, 0.0, -1.5));
        motion.sprinting = true;
        motion.speed_boost = true;
        script.push((40 + i, Action::Move(motion)));
    }

    // Arrows into the stained pane and the thick block
    script.push((60, Action::Impact(Impact { kind: ProjectileKind::Arrow, actor: Some(3), target: VoxelCoord::new(0, 20, 1, 1) })));
    script.push((61, Action::Impact(Impact { kind: ProjectileKind::Trident, actor: Some(3), target: VoxelCoord::new(0, 26, 1, 0) })));
    script.push((62, Action::Impact(Impact { kind: ProjectileKind::WindCharge, actor: None, target: VoxelCoord::new(0, 20, 3, 3) })));

    // Actor 6 punches the window; ignored unless the punch toggle is on
    script.push((70, Action::Punch(Punch { actor: 6, target: VoxelCoord::new(0, 10, 2, -2) })));

    // Actor 4 drops onto the skylight from height
    for i in 0..6u64 {
        let y = 12.0 - i as f32 * 1.2;
        let mut motion = ActorMotion::walk(4, 0, Vec3::new(32.5, y, 0.5), Vec3::new(32.5, y - 1.2, 0.5));
        motion.on_ground = false;
        motion.fall_distance = (i + 1) as f32 * 1.2;
        script.push((80 + i, Action::Move(motion)));
    }

    // Actor 5 glides low across the skylight
    for i in 0..10u64 {
        let x = 28.0 + i as f32 * 0.8;
        let mut motion = ActorMotion::walk(5, 0, Vec3::new(x, 6.0, 1.5), Vec3::new(x + 0.8, 5.6, 1.5));
        motion.gliding = true;
        motion.on_ground = false;
        script.push((100 + i, Action::Move(motion)));
    }

    // Someone bricks up a broken window cell before it regenerates
    script.push((300, Action::Place(VoxelCoord::new(0, 10, 1, 0), Voxel::of(STONE))));
    for actor in 1..=6 {
        script.push((400, Action::Leave(actor)));
    }

    script
}

fn run_action(engine: &mut Engine, action: &Action) {
    let outcome = match action {
        Action::Move(motion) => engine.on_movement(motion),
        Action::Impact(impact) => engine.on_impact(impact),
        Action::Punch(punch) => engine.on_punch(punch),
        Action::Place(coord, voxel) => {
            if let Err(e) = engine.grid_mut().set(*coord, *voxel) {
                log::warn!("Could not place voxel at {}: {}", coord, e);
            }
            return;
        }
        Action::Leave(actor) => {
            engine.forget_actor(*actor);
            return;
        }
    };

    match &outcome {
        BreakOutcome::Broken { trigger, origin, coords, truncated } => log::info!(
            "tick {}: {:?} broke {} voxels at {}{}",
            engine.clock().now(),
            trigger,
            coords.len(),
            origin,
            if *truncated { " (capped)" } else { "" }
        ),
        BreakOutcome::Refused { origin, reason } => {
            log::info!("tick {}: refused at {}: {:?}", engine.clock().now(), origin, reason)
        }
        other => log::trace!("tick {}: {:?}", engine.clock().now(), other),
    }
}

fn apply_admin_requests(engine: &mut Engine, shared: &StdMutex<SharedAdminState>, config_path: Option<&PathBuf>) {
    let requests = std::mem::take(&mut shared.lock().unwrap_or_else(PoisonError::into_inner).requests);
    for request in requests {
        log::info!("Admin request: {:?}", request);
        match request {
            AdminRequest::RestoreAll => {
                engine.force_restore_all();
            }
            AdminRequest::Toggle(feature) => {
                engine.toggle_feature(feature);
            }
            AdminRequest::ResetStats(None) => engine.stats_mut().reset(),
            AdminRequest::ResetStats(Some(actor)) => {
                if !engine.stats_mut().reset_actor(actor) {
                    log::debug!("Actor {} had no recorded breaks", actor);
                }
            }
            AdminRequest::Reload(path) => {
                let Some(path) = path.or_else(|| config_path.cloned()) else {
                    log::warn!("Reload requested but no config file is known");
                    continue;
                };
                match ShatterConfig::load(&path) {
                    Ok(config) => {
                        if let Err(e) = engine.reload(config) {
                            log::error!("Rejected config {}: {}", path.display(), e);
                        }
                    }
                    Err(e) => log::error!("Failed to load {}: {}", path.display(), e),
                }
            }
        }
    }
}

fn publish(engine: &Engine, shared: &StdMutex<SharedAdminState>) {
    let mut s = shared.lock().unwrap_or_else(PoisonError::into_inner);
    s.status = Some(engine.status());
    s.breakers = engine.stats().top_breakers(usize::MAX);
}

fn start_admin_server(state: Arc<StdMutex<SharedAdminState>>, view: LedgerView, port: u16) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create tokio runtime: {}", e);
                return;
            }
        };
        rt.block_on(async {
            let handler = Arc::new(tokio::sync::Mutex::new(SimAdminHandler { state, view }));
            let _server = AdminServer::start(handler, port);
            // Keep runtime alive for the life of the process
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });
    });
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u16_arg(args: &[String], flag: &str) -> Option<u16> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
