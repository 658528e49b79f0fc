//! Map area modifiers: pluggable rules that alter enemies and react to
//! lifecycle events inside one map area.
//!
//! Hooks receive a `ModifierContext` with mutable access to the world and
//! the spawn queue. They must not despawn entities; new entities go through
//! `ModifierContext::spawns`.

use std::collections::BTreeSet;
use std::f32::consts::TAU;
use std::fmt;

use glam::Vec2;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use circlewar_core::attack::BulletSpawn;
use circlewar_core::constants::{
    DEATH_BURST_DEFAULT_COUNT, ENEMY_BULLET_COLOR, ENTRY_GRACE_DEFAULT_SECS,
};
use circlewar_core::enums::EntityRole;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::types::{from_polar, CircleId, ColorTag};

use crate::world_setup::{EnemyData, SpawnRequest};

/// What a modifier hook may touch.
pub struct ModifierContext<'a> {
    pub world: &'a mut World,
    pub spawns: &'a mut Vec<SpawnRequest>,
    pub rng: &'a mut ChaCha8Rng,
    pub area_center: Vec2,
    pub area_radius: f32,
    /// Live enemies of the area.
    pub enemies: &'a BTreeSet<Entity>,
}

/// Lifecycle hooks of a map area. Every hook defaults to a no-op.
pub trait MapAreaModifier: Send + fmt::Debug {
    fn name(&self) -> &str;

    /// Runs before the enemy is spawned; may rewrite any of its data.
    fn on_enemy_data_creation(&mut self, _data: &mut EnemyData, _ctx: &mut ModifierContext) {}

    /// Runs after the enemy's last circle died, while it still exists.
    fn on_enemy_death(&mut self, _enemy: Entity, _ctx: &mut ModifierContext) {}

    /// Runs after the circle's health reached zero, before it is removed.
    fn on_enemy_circle_death(
        &mut self,
        _enemy: Entity,
        _circle: CircleId,
        _ctx: &mut ModifierContext,
    ) {
    }

    fn on_entity_enter(&mut self, _entity: Entity, _ctx: &mut ModifierContext) {}

    fn on_player_leave(&mut self, _player: Entity, _ctx: &mut ModifierContext) {}

    /// Once per tick while the area is focused.
    fn update(&mut self, _dt: f32, _ctx: &mut ModifierContext) {}
}

/// Scales enemy health and bullet stats as enemies are created.
#[derive(Debug, Clone)]
pub struct StatScaling {
    pub health: f32,
    pub bullet_radius: f32,
    pub bullet_speed: f32,
    pub bullet_damage: f32,
}

impl StatScaling {
    pub fn uniform(factor: f32) -> Self {
        Self {
            health: factor,
            bullet_radius: 1.0,
            bullet_speed: factor,
            bullet_damage: factor,
        }
    }
}

impl MapAreaModifier for StatScaling {
    fn name(&self) -> &str {
        "stat_scaling"
    }

    fn on_enemy_data_creation(&mut self, data: &mut EnemyData, _ctx: &mut ModifierContext) {
        for circle in &mut data.circles {
            circle.health *= self.health;
            if let Some(pattern) = circle.attack.as_mut() {
                pattern.scale_stats(self.bullet_radius, self.bullet_speed, self.bullet_damage);
            }
        }
    }
}

/// Fires a ring of enemy bullets where an enemy dies.
#[derive(Debug, Clone)]
pub struct DeathBurst {
    pub count: u32,
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    /// Also burst, smaller, for every destroyed circle.
    pub on_circle_death: bool,
}

impl Default for DeathBurst {
    fn default() -> Self {
        Self {
            count: DEATH_BURST_DEFAULT_COUNT,
            speed: 4.0,
            radius: 6.0,
            damage: 1.0,
            on_circle_death: false,
        }
    }
}

impl DeathBurst {
    fn burst(&self, center: Vec2, count: u32, ctx: &mut ModifierContext) {
        let offset = ctx.rng_offset();
        for i in 0..count {
            let angle = offset + TAU * i as f32 / count as f32;
            ctx.spawns.push(SpawnRequest::Bullet(BulletSpawn {
                source: None,
                role: EntityRole::EnemyBullet,
                origin: center,
                velocity: from_polar(angle, self.speed),
                radius: self.radius,
                color: ColorTag::new(ENEMY_BULLET_COLOR),
                damage: self.damage,
                lifesteal_percent: 0.0,
                attraction_lerp_factor: 0.0,
                lifetime_secs: None,
            }));
        }
    }
}

impl MapAreaModifier for DeathBurst {
    fn name(&self) -> &str {
        "death_burst"
    }

    fn on_enemy_death(&mut self, enemy: Entity, ctx: &mut ModifierContext) {
        let Some(center) = ctx.origin_of(enemy) else {
            return;
        };
        self.burst(center, self.count, ctx);
    }

    fn on_enemy_circle_death(
        &mut self,
        enemy: Entity,
        circle: CircleId,
        ctx: &mut ModifierContext,
    ) {
        if !self.on_circle_death {
            return;
        }
        let center = match ctx.world.get::<&HitboxComponent>(enemy) {
            Ok(hitbox) => match hitbox.circle(circle) {
                Some(c) => hitbox.circle_world_position(c),
                None => return,
            },
            Err(_) => return,
        };
        self.burst(center, (self.count / 2).max(1), ctx);
    }
}

/// Heals every live enemy in the area over time.
#[derive(Debug, Clone)]
pub struct Regeneration {
    pub health_per_sec: f32,
}

impl MapAreaModifier for Regeneration {
    fn name(&self) -> &str {
        "regeneration"
    }

    fn update(&mut self, dt: f32, ctx: &mut ModifierContext) {
        let amount = self.health_per_sec * dt;
        for &enemy in ctx.enemies {
            if let Ok(mut hitbox) = ctx.world.get::<&mut HitboxComponent>(enemy) {
                hitbox.heal(amount);
            }
        }
    }
}

/// Keeps a player intangible for a short while after entering the area.
#[derive(Debug, Clone)]
pub struct EntryGrace {
    pub secs: f32,
    active: Vec<(Entity, f32)>,
}

impl Default for EntryGrace {
    fn default() -> Self {
        Self::new(ENTRY_GRACE_DEFAULT_SECS)
    }
}

impl EntryGrace {
    pub fn new(secs: f32) -> Self {
        Self {
            secs,
            active: Vec::new(),
        }
    }

    fn release(world: &mut World, entity: Entity) {
        if let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(entity) {
            if hitbox.travel().is_none() {
                hitbox.set_intangible(false);
            }
        }
    }
}

impl MapAreaModifier for EntryGrace {
    fn name(&self) -> &str {
        "entry_grace"
    }

    fn on_entity_enter(&mut self, entity: Entity, ctx: &mut ModifierContext) {
        let is_player = ctx
            .world
            .get::<&EntityRole>(entity)
            .map(|role| *role == EntityRole::Player)
            .unwrap_or(false);
        if !is_player {
            return;
        }
        self.active.retain(|(e, _)| *e != entity);
        self.active.push((entity, self.secs));
    }

    fn on_player_leave(&mut self, player: Entity, ctx: &mut ModifierContext) {
        let before = self.active.len();
        self.active.retain(|(e, _)| *e != player);
        if self.active.len() != before {
            Self::release(ctx.world, player);
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut ModifierContext) {
        let mut expired = Vec::new();
        for (entity, remaining) in &mut self.active {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*entity);
            } else if let Ok(mut hitbox) = ctx.world.get::<&mut HitboxComponent>(*entity) {
                hitbox.set_intangible(true);
            }
        }
        for entity in expired {
            self.active.retain(|(e, _)| *e != entity);
            Self::release(ctx.world, entity);
        }
    }
}

impl ModifierContext<'_> {
    /// Origin of a live entity's hitbox.
    pub fn origin_of(&self, entity: Entity) -> Option<Vec2> {
        self.world
            .get::<&HitboxComponent>(entity)
            .ok()
            .map(|hitbox| hitbox.origin())
    }

    fn rng_offset(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }
}
