//! Engine configuration.
//!
//! Everything here is a read-only input to the engine. Hosts may build it in
//! code (starting from `Default`) or hand over JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::time::{TickClock, DEFAULT_TICK_MS};
use crate::core::types::Result;
use crate::voxel::material::{FamilyDelays, FragileKind, MaterialRegistry};
use crate::voxel::voxel::MaterialId;
use super::structure::DEFAULT_STRUCTURE_CAP;
use super::trigger::{ProjectileKind, TriggerKind};

/// Largest break radius a trigger may use
pub const MAX_TRIGGER_RADIUS: i32 = 16;

/// Longest accepted tick length (one minute)
pub const MAX_TICK_MS: u64 = 60_000;

/// Runtime-switchable feature families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Projectile,
    Punch,
    Glide,
    Fall,
    Run,
    Regeneration,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Projectile,
        Feature::Punch,
        Feature::Glide,
        Feature::Fall,
        Feature::Run,
        Feature::Regeneration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Projectile => "projectile",
            Feature::Punch => "punch",
            Feature::Glide => "glide",
            Feature::Fall => "fall",
            Feature::Run => "run",
            Feature::Regeneration => "regeneration",
        }
    }

    /// Parse the lowercase admin name of a feature
    pub fn from_name(name: &str) -> Option<Feature> {
        match name.to_ascii_lowercase().as_str() {
            "projectile" | "arrow" => Some(Feature::Projectile),
            "punch" | "punch_to_break" => Some(Feature::Punch),
            "glide" | "elytra" => Some(Feature::Glide),
            "fall" | "falling" => Some(Feature::Fall),
            "run" | "running" | "sprint" => Some(Feature::Run),
            "regeneration" | "regen" => Some(Feature::Regeneration),
            _ => None,
        }
    }
}

/// Feature toggles. Punching is off unless a host opts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub projectile: bool,
    pub punch: bool,
    pub glide: bool,
    pub fall: bool,
    pub run: bool,
    pub regeneration: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            projectile: true,
            punch: false,
            glide: true,
            fall: true,
            run: true,
            regeneration: true,
        }
    }
}

impl FeatureFlags {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::Projectile => self.projectile,
            Feature::Punch => self.punch,
            Feature::Glide => self.glide,
            Feature::Fall => self.fall,
            Feature::Run => self.run,
            Feature::Regeneration => self.regeneration,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Projectile => self.projectile = enabled,
            Feature::Punch => self.punch = enabled,
            Feature::Glide => self.glide = enabled,
            Feature::Fall => self.fall = enabled,
            Feature::Run => self.run = enabled,
            Feature::Regeneration => self.regeneration = enabled,
        }
    }
}

/// Regeneration delay per kind family, in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    pub glass_secs: f32,
    pub pane_secs: f32,
    pub stained_secs: f32,
    pub stained_pane_secs: f32,
    pub tinted_secs: f32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            glass_secs: 30.0,
            pane_secs: 25.0,
            stained_secs: 35.0,
            stained_pane_secs: 30.0,
            tinted_secs: 40.0,
        }
    }
}

impl RegenConfig {
    pub fn to_ticks(&self, clock: &TickClock) -> FamilyDelays {
        FamilyDelays {
            glass: clock.secs_to_ticks(self.glass_secs),
            pane: clock.secs_to_ticks(self.pane_secs),
            stained: clock.secs_to_ticks(self.stained_secs),
            stained_pane: clock.secs_to_ticks(self.stained_pane_secs),
            tinted: clock.secs_to_ticks(self.tinted_secs),
        }
    }
}

/// Explicit palette entry overriding the default material table
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub material_id: MaterialId,
    pub kind: FragileKind,
}

/// Movement gating
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Displacement per tick below which motion is not evaluated at all
    pub min_speed: f32,
    /// Minimum time between permitted breaks for one actor
    pub cooldown_ms: u64,
    /// Fall distance required before a fall can break glass
    pub fall_min_distance: f32,
    /// Sprinting only breaks glass while a speed boost is active
    pub sprint_requires_boost: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            min_speed: 0.3,
            cooldown_ms: 500,
            fall_min_distance: 3.0,
            sprint_requires_boost: true,
        }
    }
}

/// Path sampling parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathScanConfig {
    /// Displacements at or below this length skip path sampling
    pub threshold: f32,
    /// Approximate distance between samples
    pub step: f32,
    pub min_samples: u32,
    pub max_samples: u32,
    /// Body sample offsets relative to the actor position (feet, head)
    pub sample_offsets: Vec<[f32; 3]>,
}

impl Default for PathScanConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            step: 0.2,
            min_samples: 3,
            max_samples: 10,
            sample_offsets: vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }
}

impl PathScanConfig {
    pub fn offsets(&self) -> Vec<Vec3> {
        self.sample_offsets.iter().map(|&o| Vec3::from_array(o)).collect()
    }
}

/// How a confirmed candidate turns into broken voxels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakMode {
    /// Flood-fill the connected same-kind structure
    Structure,
    /// Break everything within the radius of the candidate
    Area,
}

/// Cuboid searched around the body when straight-line scans miss
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub horizontal: i32,
    pub y_min: i32,
    pub y_max: i32,
}

/// Per-trigger parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerProfile {
    pub radius: i32,
    /// Minimum relevant speed (per tick) for the trigger to break glass
    pub min_speed: f32,
    pub mode: BreakMode,
    pub neighborhood: Option<Neighborhood>,
}

impl TriggerProfile {
    fn impact(radius: i32) -> Self {
        Self {
            radius,
            min_speed: 0.0,
            mode: BreakMode::Structure,
            neighborhood: None,
        }
    }

    /// Only the targeted voxel
    fn single() -> Self {
        Self {
            radius: 0,
            min_speed: 0.0,
            mode: BreakMode::Area,
            neighborhood: None,
        }
    }

    fn movement(radius: i32, min_speed: f32, neighborhood: Neighborhood) -> Self {
        Self {
            radius,
            min_speed,
            mode: BreakMode::Area,
            neighborhood: Some(neighborhood),
        }
    }
}

/// Trigger profiles
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerTable {
    pub arrow: TriggerProfile,
    pub trident: TriggerProfile,
    pub wind_charge: TriggerProfile,
    pub punch: TriggerProfile,
    pub glide: TriggerProfile,
    pub fall: TriggerProfile,
    pub run: TriggerProfile,
    pub sprint: TriggerProfile,
}

impl Default for TriggerTable {
    fn default() -> Self {
        Self {
            arrow: TriggerProfile::impact(1),
            trident: TriggerProfile::impact(2),
            wind_charge: TriggerProfile::impact(3),
            punch: TriggerProfile::single(),
            glide: TriggerProfile::movement(2, 0.5, Neighborhood { horizontal: 1, y_min: 0, y_max: 1 }),
            fall: TriggerProfile::movement(2, 0.5, Neighborhood { horizontal: 2, y_min: -2, y_max: 2 }),
            run: TriggerProfile::movement(1, 0.3, Neighborhood { horizontal: 1, y_min: 0, y_max: 2 }),
            sprint: TriggerProfile::movement(2, 0.4, Neighborhood { horizontal: 2, y_min: 0, y_max: 2 }),
        }
    }
}

impl TriggerTable {
    pub fn profile(&self, trigger: TriggerKind) -> &TriggerProfile {
        match trigger {
            TriggerKind::Projectile(ProjectileKind::Arrow) => &self.arrow,
            TriggerKind::Projectile(ProjectileKind::Trident) => &self.trident,
            TriggerKind::Projectile(ProjectileKind::WindCharge) => &self.wind_charge,
            TriggerKind::Punch => &self.punch,
            TriggerKind::Glide => &self.glide,
            TriggerKind::Fall => &self.fall,
            TriggerKind::Run => &self.run,
            TriggerKind::Sprint => &self.sprint,
        }
    }

    fn all(&self) -> [(&'static str, &TriggerProfile); 8] {
        [
            ("arrow", &self.arrow),
            ("trident", &self.trident),
            ("wind_charge", &self.wind_charge),
            ("punch", &self.punch),
            ("glide", &self.glide),
            ("fall", &self.fall),
            ("run", &self.run),
            ("sprint", &self.sprint),
        ]
    }
}

/// Full engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShatterConfig {
    /// Length of one simulation tick
    pub tick_ms: u64,
    pub features: FeatureFlags,
    pub regen: RegenConfig,
    /// Material table; empty means the default palette
    pub palette: Vec<PaletteEntry>,
    pub movement: MovementConfig,
    pub path: PathScanConfig,
    pub triggers: TriggerTable,
    /// Upper bound on voxels yielded by one structure flood fill
    pub structure_cap: usize,
    /// Maximum number of pending restorations
    pub scheduler_capacity: usize,
}

impl Default for ShatterConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            features: FeatureFlags::default(),
            regen: RegenConfig::default(),
            palette: Vec::new(),
            movement: MovementConfig::default(),
            path: PathScanConfig::default(),
            triggers: TriggerTable::default(),
            structure_cap: DEFAULT_STRUCTURE_CAP,
            scheduler_capacity: 65_536,
        }
    }
}

impl ShatterConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ShatterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded shatter config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 || self.tick_ms > MAX_TICK_MS {
            return Err(Error::Config(format!("tick_ms must be within 1..={}", MAX_TICK_MS)));
        }
        if self.structure_cap == 0 {
            return Err(Error::Config("structure_cap must be positive".into()));
        }
        if self.path.step <= 0.0 {
            return Err(Error::Config("path.step must be positive".into()));
        }
        if self.path.min_samples == 0 || self.path.min_samples > self.path.max_samples {
            return Err(Error::Config(format!(
                "path sample bounds {}..={} are invalid",
                self.path.min_samples, self.path.max_samples
            )));
        }
        if self.path.sample_offsets.is_empty() {
            return Err(Error::Config("path.sample_offsets must not be empty".into()));
        }
        for (name, profile) in self.triggers.all() {
            if !(0..=MAX_TRIGGER_RADIUS).contains(&profile.radius) {
                return Err(Error::Config(format!(
                    "trigger {} radius {} is outside 0..={}",
                    name, profile.radius, MAX_TRIGGER_RADIUS
                )));
            }
        }
        Ok(())
    }

    /// Tick clock matching `tick_ms`
    pub fn clock(&self) -> TickClock {
        TickClock::new(self.tick_ms)
    }

    /// Build the material registry described by this configuration
    pub fn registry(&self) -> MaterialRegistry {
        let delays = self.regen.to_ticks(&self.clock());
        if self.palette.is_empty() {
            MaterialRegistry::with_default_palette(delays)
        } else {
            MaterialRegistry::new(self.palette.iter().map(|e| (e.material_id, e.kind)), delays)
        }
    }
}
