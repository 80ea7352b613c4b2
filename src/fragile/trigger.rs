//! Trigger kinds and movement classification

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, WorldId};
use crate::math::Segment;
use crate::voxel::coord::VoxelCoord;
use super::config::{Feature, MovementConfig, TriggerTable};

/// Projectiles that shatter glass on impact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Arrow,
    Trident,
    WindCharge,
}

/// What caused a break attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Projectile(ProjectileKind),
    Punch,
    Glide,
    Fall,
    Run,
    Sprint,
}

impl TriggerKind {
    /// Feature toggle governing this trigger
    pub fn feature(&self) -> Feature {
        match self {
            TriggerKind::Projectile(_) => Feature::Projectile,
            TriggerKind::Punch => Feature::Punch,
            TriggerKind::Glide => Feature::Glide,
            TriggerKind::Fall => Feature::Fall,
            TriggerKind::Run | TriggerKind::Sprint => Feature::Run,
        }
    }

    pub fn is_movement(&self) -> bool {
        !matches!(self, TriggerKind::Projectile(_) | TriggerKind::Punch)
    }
}

/// One tick of actor motion as reported by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorMotion {
    pub actor: ActorId,
    pub world: WorldId,
    pub from: Vec3,
    pub to: Vec3,
    pub gliding: bool,
    pub on_ground: bool,
    pub sprinting: bool,
    /// A speed effect (potion, beacon) is active
    pub speed_boost: bool,
    /// Distance fallen since last touching ground
    pub fall_distance: f32,
    /// Spectating actors never interact with the world
    pub spectator: bool,
}

impl ActorMotion {
    /// Grounded walk from `from` to `to` with every flag cleared
    pub fn walk(actor: ActorId, world: WorldId, from: Vec3, to: Vec3) -> Self {
        Self {
            actor,
            world,
            from,
            to,
            gliding: false,
            on_ground: true,
            sprinting: false,
            speed_boost: false,
            fall_distance: 0.0,
            spectator: false,
        }
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.from, self.to)
    }

    /// Total displacement this tick
    pub fn speed(&self) -> f32 {
        self.segment().length()
    }

    pub fn horizontal_speed(&self) -> f32 {
        let d = self.to - self.from;
        (d.x * d.x + d.z * d.z).sqrt()
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.to.y - self.from.y
    }
}

/// A projectile hitting a voxel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    pub kind: ProjectileKind,
    /// Shooter, if any
    pub actor: Option<ActorId>,
    pub target: VoxelCoord,
}

/// An actor striking a voxel by hand
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Punch {
    pub actor: ActorId,
    pub target: VoxelCoord,
}

/// Decide which movement trigger, if any, a motion sample represents.
///
/// Gliding takes priority over falling, falling over running. The speed
/// relevant to each trigger must reach that trigger's own minimum.
pub fn classify_motion(
    motion: &ActorMotion,
    movement: &MovementConfig,
    triggers: &TriggerTable,
) -> Option<TriggerKind> {
    if motion.spectator {
        return None;
    }

    let gate = movement.min_speed;
    let vy = motion.vertical_velocity();

    if motion.gliding {
        return (motion.speed() >= triggers.glide.min_speed).then_some(TriggerKind::Glide);
    }

    let falling = vy < -gate && !motion.on_ground;
    if falling {
        let deep_enough = motion.fall_distance >= movement.fall_min_distance;
        let fast_enough = vy.abs() >= triggers.fall.min_speed;
        return (deep_enough && fast_enough).then_some(TriggerKind::Fall);
    }

    let horizontal = motion.horizontal_speed();
    if horizontal <= gate {
        return None;
    }

    if motion.sprinting && (motion.speed_boost || !movement.sprint_requires_boost) {
        if horizontal >= triggers.sprint.min_speed {
            return Some(TriggerKind::Sprint);
        }
        return None;
    }

    (horizontal >= triggers.run.min_speed).then_some(TriggerKind::Run)
}
