//! Straight motion segment between two body positions

use crate::core::types::Vec3;

/// A displacement from `from` to `to`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: Vec3,
    pub to: Vec3,
}

impl Segment {
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self { from, to }
    }

    /// Displacement vector
    pub fn delta(&self) -> Vec3 {
        self.to - self.from
    }

    /// Segment length
    pub fn length(&self) -> f32 {
        self.delta().length()
    }

    /// Unit direction of travel, or None for a zero-length segment
    pub fn direction(&self) -> Option<Vec3> {
        self.delta().try_normalize()
    }

    /// Point at parameter t (0 = from, 1 = to)
    pub fn at(&self, t: f32) -> Vec3 {
        self.from + self.delta() * t
    }

    /// Number of samples for a path scan: `length / step`, clamped to
    /// `[min_samples, max_samples]`.
    pub fn sample_count(&self, step: f32, min_samples: u32, max_samples: u32) -> u32 {
        let raw = if step > 0.0 {
            (self.length() / step) as u32
        } else {
            max_samples
        };
        raw.clamp(min_samples, max_samples.max(min_samples))
    }

    /// Evenly spaced sample points after `from`, ending exactly at `to`.
    pub fn samples(&self, count: u32) -> impl Iterator<Item = Vec3> + '_ {
        let count = count.max(1);
        (1..=count).map(move |i| self.at(i as f32 / count as f32))
    }
}
