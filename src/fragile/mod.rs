//! Breakability policy: configuration, trigger classification, thickness,
//! structure flood fill and collision scanning

pub mod config;
pub mod trigger;
pub mod thickness;
pub mod structure;
pub mod scan;

pub use config::{
    BreakMode, Feature, FeatureFlags, MovementConfig, Neighborhood, PathScanConfig, RegenConfig,
    ShatterConfig, TriggerProfile, TriggerTable, MAX_TICK_MS, MAX_TRIGGER_RADIUS,
};
pub use trigger::{classify_motion, ActorMotion, Impact, ProjectileKind, Punch, TriggerKind};
pub use thickness::ThicknessAnalyzer;
pub use structure::{Structure, StructureResolver, DEFAULT_STRUCTURE_CAP};
pub use scan::CollisionScanner;
