//! Per-actor break cooldown

use std::collections::HashMap;

use glam::Vec3;

use crate::core::types::ActorId;

/// Transient movement state for one actor
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActorMovementState {
    /// Time of the last permitted break, in milliseconds
    pub last_break_ms: Option<u64>,
    pub last_position: Option<Vec3>,
}

/// Bounds how often a single actor may break glass
#[derive(Debug, Default)]
pub struct RateLimiter {
    actors: HashMap<ActorId, ActorMovementState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a break at `now_ms` would pass the cooldown, without recording it
    pub fn would_allow(&self, actor: ActorId, now_ms: u64, min_interval_ms: u64) -> bool {
        match self.actors.get(&actor).and_then(|s| s.last_break_ms) {
            Some(last) => now_ms.saturating_sub(last) > min_interval_ms,
            None => true,
        }
    }

    /// Permit a break if more than `min_interval_ms` elapsed since the
    /// actor's last permitted one. Only a permitted break is recorded.
    pub fn allow(&mut self, actor: ActorId, now_ms: u64, min_interval_ms: u64) -> bool {
        if !self.would_allow(actor, now_ms, min_interval_ms) {
            return false;
        }
        self.actors.entry(actor).or_default().last_break_ms = Some(now_ms);
        true
    }

    pub fn record_position(&mut self, actor: ActorId, pos: Vec3) {
        self.actors.entry(actor).or_default().last_position = Some(pos);
    }

    pub fn last_position(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).and_then(|s| s.last_position)
    }

    pub fn state(&self, actor: ActorId) -> Option<ActorMovementState> {
        self.actors.get(&actor).copied()
    }

    /// Drop everything known about an actor
    pub fn forget(&mut self, actor: ActorId) -> bool {
        self.actors.remove(&actor).is_some()
    }

    /// Number of tracked actors
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_is_strict() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.allow(1, 1000, 500));
        assert!(!limiter.allow(1, 1499, 500));
        assert!(!limiter.allow(1, 1500, 500));
        assert!(limiter.allow(1, 1501, 500));
    }

    #[test]
    fn test_denied_attempt_does_not_reset() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.allow(1, 0, 500));
        assert!(!limiter.allow(1, 400, 500));
        // Still measured from the permitted break at 0
        assert!(limiter.allow(1, 501, 500));
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.would_allow(1, 0, 500));
        assert!(limiter.would_allow(1, 0, 500));
        assert!(limiter.allow(1, 0, 500));
        assert!(!limiter.would_allow(1, 100, 500));
    }

    #[test]
    fn test_actors_are_independent() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.allow(1, 0, 500));
        assert!(limiter.allow(2, 10, 500));
        limiter.record_position(3, Vec3::ONE);
        assert_eq!(limiter.last_position(3), Some(Vec3::ONE));
        assert_eq!(limiter.len(), 3);
        assert!(limiter.forget(3));
        assert!(!limiter.forget(3));
        assert_eq!(limiter.last_position(3), None);
    }
}
