//! Trigger pipeline, host collaborators and per-actor bookkeeping

pub mod host;
pub mod limiter;
pub mod stats;
pub mod outcome;
pub mod engine;

pub use host::{AllowAll, EffectEvent, EffectsSink, NoEffects, RecordingEffects, RegionAuthority};
pub use limiter::{ActorMovementState, RateLimiter};
pub use stats::{ActorStats, BreakStats};
pub use outcome::{BreakOutcome, EngineStatus, Refusal};
pub use engine::{impact_cap, Engine};
