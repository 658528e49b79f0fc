//! ECS components for hecs entities.
//!
//! The heavyweight `HitboxComponent` lives in `hitbox`; `EntityRole` from
//! `enums` is attached directly as a component. Everything here is plain data.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, MapAreaId};

/// Payload carried by every bullet entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub damage: f32,
    /// Fraction of dealt damage healed back onto the shooter.
    pub lifesteal_percent: f32,
    /// Homing strength; 0 flies straight.
    pub attraction_lerp_factor: f32,
    /// Speed (units per frame) kept constant while homing.
    pub speed: f32,
    /// Entity that fired the bullet, if any.
    pub source: Option<EntityId>,
}

/// Seconds until the entity despawns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining_secs: f32,
}

/// Marks a boss enemy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boss;

/// Map area an enemy was spawned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaMember(pub MapAreaId);
