//! Core type aliases and re-exports

pub use glam::{Vec3, IVec3};

/// Standard Result type for the engine
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Simulation tick counter.
pub type Tick = u64;

/// Opaque identifier of an actor (player, mob, projectile owner).
pub type ActorId = u64;

/// Opaque identifier of a world/dimension.
pub type WorldId = u32;
