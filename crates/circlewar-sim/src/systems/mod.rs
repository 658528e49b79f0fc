//! ECS systems that operate on the simulation world each tick.
//!
//! Systems are free functions over `&mut World` plus the explicit buffers
//! they read or fill. They do not own state; all state lives in components,
//! map areas, and the engine's queues.

pub mod ai;
pub mod bullets;
pub mod movement;
pub mod removal;
pub mod shooting;
pub mod snapshot;

use std::collections::BTreeSet;

use glam::Vec2;
use hecs::{Entity, World};

use circlewar_core::hitbox::HitboxComponent;

/// Origin of an entity's hitbox, if it is alive and has one.
pub(crate) fn origin_of(world: &World, entity: Option<Entity>) -> Option<Vec2> {
    let entity = entity?;
    world
        .get::<&HitboxComponent>(entity)
        .ok()
        .map(|hitbox| hitbox.origin())
}

/// Origins of the given enemies, in set order.
pub(crate) fn enemy_origins(world: &World, enemies: &BTreeSet<Entity>) -> Vec<Vec2> {
    enemies
        .iter()
        .filter_map(|&enemy| origin_of(world, Some(enemy)))
        .collect()
}

/// The point closest to `from`. Ties go to the earliest point.
pub(crate) fn nearest(points: &[Vec2], from: Vec2) -> Option<Vec2> {
    let mut best: Option<(Vec2, f32)> = None;
    for &point in points {
        let d = point.distance_squared(from);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((point, d));
        }
    }
    best.map(|(point, _)| point)
}
