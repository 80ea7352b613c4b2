//! Simulation tick timing

use crate::core::types::Tick;

/// Default tick length of the host simulation (20 ticks per second).
pub const DEFAULT_TICK_MS: u64 = 50;

/// Tracks the current simulation tick.
///
/// All deferred work in the engine is expressed in ticks; wall-clock
/// milliseconds are derived from the tick count so cooldowns stay
/// deterministic under test.
#[derive(Clone, Copy, Debug)]
pub struct TickClock {
    tick: Tick,
    tick_ms: u64,
}

impl TickClock {
    /// Create a clock at tick 0 with the given tick length.
    pub fn new(tick_ms: u64) -> Self {
        Self {
            tick: 0,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Call once per simulation tick
    pub fn advance(&mut self) -> Tick {
        self.tick = self.tick.saturating_add(1);
        self.tick
    }

    /// Jump forward by several ticks at once.
    pub fn advance_by(&mut self, ticks: Tick) -> Tick {
        self.tick = self.tick.saturating_add(ticks);
        self.tick
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.tick
    }

    /// Milliseconds elapsed since tick 0
    pub fn now_ms(&self) -> u64 {
        self.tick.saturating_mul(self.tick_ms)
    }

    /// Length of one tick in milliseconds
    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    /// Convert seconds to a whole number of ticks (rounded up).
    pub fn secs_to_ticks(&self, secs: f32) -> Tick {
        if secs <= 0.0 {
            return 0;
        }
        ((secs * 1000.0) / self.tick_ms as f32).ceil() as Tick
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = TickClock::default();
        assert_eq!(clock.now(), 0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), 2);
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn test_secs_to_ticks() {
        let clock = TickClock::default();
        assert_eq!(clock.secs_to_ticks(30.0), 600);
        assert_eq!(clock.secs_to_ticks(0.0), 0);
        assert_eq!(clock.secs_to_ticks(0.01), 1);
    }

    #[test]
    fn test_long_runs_saturate() {
        let mut clock = TickClock::new(60_000);
        clock.advance_by(Tick::MAX - 1);
        assert_eq!(clock.now_ms(), u64::MAX);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), Tick::MAX);
    }
}
