//! In-memory break statistics

use std::collections::HashMap;

use serde::Serialize;

use crate::core::types::ActorId;

/// Break count for one actor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActorStats {
    pub actor: ActorId,
    pub breaks: u64,
}

/// Voxels broken per actor since start or the last reset
#[derive(Debug, Default)]
pub struct BreakStats {
    per_actor: HashMap<ActorId, u64>,
    /// Breaks with no responsible actor (dispenser arrows and the like)
    anonymous: u64,
}

impl BreakStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, actor: Option<ActorId>, voxels: u64) {
        match actor {
            Some(actor) => *self.per_actor.entry(actor).or_insert(0) += voxels,
            None => self.anonymous += voxels,
        }
    }

    pub fn breaks(&self, actor: ActorId) -> u64 {
        self.per_actor.get(&actor).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.anonymous + self.per_actor.values().sum::<u64>()
    }

    /// Up to `limit` actors with the most breaks, highest first
    pub fn top_breakers(&self, limit: usize) -> Vec<ActorStats> {
        let mut all: Vec<ActorStats> = self
            .per_actor
            .iter()
            .map(|(&actor, &breaks)| ActorStats { actor, breaks })
            .collect();
        all.sort_by(|a, b| b.breaks.cmp(&a.breaks).then(a.actor.cmp(&b.actor)));
        all.truncate(limit);
        all
    }

    /// Clear one actor's count. Returns false if the actor had none.
    pub fn reset_actor(&mut self, actor: ActorId) -> bool {
        self.per_actor.remove(&actor).is_some()
    }

    pub fn reset(&mut self) {
        self.per_actor.clear();
        self.anonymous = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_breakers() {
        let mut stats = BreakStats::new();
        stats.record(Some(1), 3);
        stats.record(Some(2), 9);
        stats.record(Some(3), 3);
        stats.record(Some(1), 1);
        stats.record(None, 5);

        assert_eq!(stats.total(), 21);
        assert_eq!(stats.breaks(1), 4);
        let top = stats.top_breakers(2);
        assert_eq!(top, vec![ActorStats { actor: 2, breaks: 9 }, ActorStats { actor: 1, breaks: 4 }]);
    }

    #[test]
    fn test_reset() {
        let mut stats = BreakStats::new();
        stats.record(Some(1), 3);
        stats.reset();
        assert_eq!(stats.total(), 0);
        assert!(stats.top_breakers(10).is_empty());
    }

    #[test]
    fn test_reset_actor() {
        let mut stats = BreakStats::new();
        stats.record(Some(1), 3);
        stats.record(Some(2), 4);
        stats.record(None, 2);

        assert!(stats.reset_actor(1));
        assert!(!stats.reset_actor(1));
        assert_eq!(stats.breaks(1), 0);
        assert_eq!(stats.breaks(2), 4);
        assert_eq!(stats.total(), 6);
    }
}
