//! Entity spawn factories.
//!
//! Every entity in the world is created here, with the component bundle
//! for its role. The engine funnels mid-tick creation through
//! `SpawnRequest`s that are drained between system passes.

use glam::Vec2;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use circlewar_ai::AiStrategy;
use circlewar_core::attack::{AttackPattern, BulletSpawn};
use circlewar_core::components::{AreaMember, Boss, Bullet, Lifetime};
use circlewar_core::constants::{ENEMY_COLOR, PLAYER_COLOR};
use circlewar_core::enums::EntityRole;
use circlewar_core::error::HitboxError;
use circlewar_core::hitbox::{CircleHitbox, HitboxComponent};
use circlewar_core::types::{ColorTag, EntityId, MapAreaId};

use crate::collision::CustomCollision;
use crate::config::PlayerConfig;

/// Stable external id for an ECS entity.
pub fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits().get())
}

/// Inverse of `entity_id`. The entity may no longer be alive.
pub fn entity_from_id(id: EntityId) -> Option<Entity> {
    Entity::from_bits(id.0)
}

/// Stats given to pieces that break off an enemy. Without this component a
/// piece clones its parent's AI and max speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEntityStats {
    pub max_speed: f32,
    pub ai: Option<AiStrategy>,
}

/// One circle of an enemy template, relative to the enemy origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleSpec {
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub color: Option<ColorTag>,
    pub attack: Option<AttackPattern>,
}

impl CircleSpec {
    pub fn new(position: Vec2, radius: f32, health: f32) -> Self {
        Self {
            position,
            radius,
            health,
            color: None,
            attack: None,
        }
    }

    pub fn with_attack(mut self, pattern: AttackPattern) -> Self {
        self.attack = Some(pattern);
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(ColorTag::new(color));
        self
    }
}

/// Everything needed to materialize an enemy. Map area modifiers may edit
/// it before the enemy exists.
#[derive(Debug, Clone)]
pub struct EnemyData {
    pub position: Vec2,
    pub max_speed: f32,
    pub facing_angle: f32,
    pub circles: Vec<CircleSpec>,
    pub ai: AiStrategy,
    pub boss: bool,
    pub sub_entity_stats: Option<SubEntityStats>,
    pub collision: Option<CustomCollision>,
}

impl EnemyData {
    pub fn new(position: Vec2, max_speed: f32, ai: AiStrategy) -> Self {
        Self {
            position,
            max_speed,
            facing_angle: 0.0,
            circles: Vec::new(),
            ai,
            boss: false,
            sub_entity_stats: None,
            collision: None,
        }
    }

    pub fn with_circle(mut self, circle: CircleSpec) -> Self {
        self.circles.push(circle);
        self
    }
}

/// Deferred entity creation.
#[derive(Debug, Clone)]
pub enum SpawnRequest {
    Bullet(BulletSpawn),
    Enemy { area: MapAreaId, data: EnemyData },
}

/// Build a hitbox from circles laid out relative to `origin`: add every
/// circle, recenter, then place and rotate.
fn assemble_hitbox(
    origin: Vec2,
    max_speed: f32,
    facing_angle: f32,
    circles: impl IntoIterator<Item = CircleHitbox>,
) -> HitboxComponent {
    let mut hitbox = HitboxComponent::new(origin, max_speed);
    for circle in circles {
        hitbox.add_circle(circle);
    }
    hitbox.recenter_original_circle_positions();
    hitbox.set_last_faced_angle(facing_angle);
    hitbox
}

/// Spawn the player as a single circle at `position`.
pub fn spawn_player(
    world: &mut World,
    config: &PlayerConfig,
    position: Vec2,
) -> Result<Entity, HitboxError> {
    let mut circle = CircleHitbox::new(
        Vec2::ZERO,
        config.radius,
        config.health,
        ColorTag::new(PLAYER_COLOR),
    )?;
    if let Some(pattern) = &config.attack {
        circle = circle.with_attack_pattern(pattern.clone());
    }
    let hitbox = assemble_hitbox(position, config.max_speed, 0.0, [circle]);
    let entity = world.spawn((hitbox, EntityRole::Player));
    log::debug!("spawned player {:?} at {position}", entity_id(entity));
    Ok(entity)
}

/// Spawn an enemy from (already modified) data into `area`.
///
/// The enemy's origin ends up at the center of its circles' bounding box,
/// which is `data.position` only when the template is symmetric. A template
/// with no circles could never be hit or removed, so it is rejected.
pub fn spawn_enemy(
    world: &mut World,
    area: MapAreaId,
    data: EnemyData,
) -> Result<Entity, HitboxError> {
    if data.circles.is_empty() {
        return Err(HitboxError::NoCircles);
    }
    let mut circles = Vec::with_capacity(data.circles.len());
    let mut armed = false;
    for spec in data.circles {
        let color = spec.color.unwrap_or_else(|| ColorTag::new(ENEMY_COLOR));
        let mut circle = CircleHitbox::new(spec.position, spec.radius, spec.health, color)?;
        if let Some(pattern) = spec.attack {
            armed |= !pattern.parts().is_empty();
            circle = circle.with_attack_pattern(pattern);
        }
        circles.push(circle);
    }

    let mut hitbox = assemble_hitbox(data.position, data.max_speed, data.facing_angle, circles);
    hitbox.set_shooting(armed);

    let entity = world.spawn((hitbox, EntityRole::Enemy, data.ai, AreaMember(area)));
    if data.boss {
        let _ = world.insert_one(entity, Boss);
    }
    if let Some(stats) = data.sub_entity_stats {
        let _ = world.insert_one(entity, stats);
    }
    if let Some(collision) = data.collision {
        let _ = world.insert_one(entity, collision);
    }
    log::debug!("spawned enemy {:?} in area {:?}", entity_id(entity), area);
    Ok(entity)
}

/// Spawn a bullet entity: one circle, a `Bullet` payload, and an optional lifetime.
pub fn spawn_bullet(world: &mut World, spawn: BulletSpawn) -> Result<Entity, HitboxError> {
    // Bullets hold health only so the generic hitbox invariants hold; they
    // are removed on first hit regardless.
    let circle = CircleHitbox::new(Vec2::ZERO, spawn.radius, 1.0, spawn.color)?;
    let speed = spawn.velocity.length();
    let mut hitbox = assemble_hitbox(spawn.origin, speed, 0.0, [circle]);
    hitbox.set_velocity(spawn.velocity);

    let bullet = Bullet {
        damage: spawn.damage,
        lifesteal_percent: spawn.lifesteal_percent,
        attraction_lerp_factor: spawn.attraction_lerp_factor,
        speed,
        source: spawn.source,
    };
    let entity = world.spawn((hitbox, spawn.role, bullet));
    if let Some(remaining_secs) = spawn.lifetime_secs {
        let _ = world.insert_one(entity, Lifetime { remaining_secs });
    }
    Ok(entity)
}
