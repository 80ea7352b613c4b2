//! Shatter - breakable, self-repairing glass structures for voxel worlds

pub mod core;
pub mod math;
pub mod voxel;
pub mod fragile;
pub mod ledger;
pub mod engine;

pub use crate::core::Error;
pub use crate::engine::{BreakOutcome, Engine};
pub use crate::fragile::ShatterConfig;
