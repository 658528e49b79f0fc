//! Steering system: travel, enemy strategies, and homing bullets.

use std::collections::BTreeSet;

use glam::Vec2;
use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;

use circlewar_ai::{AiContext, AiStrategy};
use circlewar_core::components::Bullet;
use circlewar_core::constants::TRAVEL_ARRIVAL_DISTANCE;
use circlewar_core::enums::EntityRole;
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;

use super::{enemy_origins, nearest, origin_of};
use crate::world_setup::entity_id;

/// Run all steering for one tick.
///
/// `active_enemies` is the focused area's enemy set; enemies outside it are
/// left untouched.
pub fn run(
    world: &mut World,
    player: Option<Entity>,
    active_enemies: Option<&BTreeSet<Entity>>,
    rng: &mut ChaCha8Rng,
    dt: f32,
    events: &mut Vec<SimEvent>,
) {
    let player_origin = origin_of(world, player);
    let targets = active_enemies
        .map(|enemies| enemy_origins(world, enemies))
        .unwrap_or_default();

    steer_travellers(world, events);
    if let Some(enemies) = active_enemies {
        run_strategies(world, enemies, player_origin, rng, dt);
    }
    steer_homing_bullets(world, player_origin, &targets);
}

/// Point travelling entities at their destination and finish arrivals.
pub fn steer_travellers(world: &mut World, events: &mut Vec<SimEvent>) {
    for (entity, hitbox) in world.query_mut::<&mut HitboxComponent>() {
        let Some(travel) = hitbox.travel() else {
            continue;
        };
        let to_destination = travel.destination - hitbox.origin();
        let distance = to_destination.length();
        if distance <= TRAVEL_ARRIVAL_DISTANCE {
            hitbox.set_origin(travel.destination);
            hitbox.finish_travel();
            events.push(SimEvent::TravelCompleted {
                entity: entity_id(entity),
            });
            log::debug!("{:?} arrived at {}", entity_id(entity), travel.destination);
        } else {
            // Never overshoot: the last step lands exactly on the destination.
            let step = travel.speed.min(distance);
            hitbox.set_velocity(to_destination / distance * step);
            hitbox.set_acceleration(Vec2::ZERO);
        }
    }
}

fn run_strategies(
    world: &mut World,
    enemies: &BTreeSet<Entity>,
    player_origin: Option<Vec2>,
    rng: &mut ChaCha8Rng,
    dt: f32,
) {
    for (entity, (hitbox, strategy)) in
        world.query_mut::<(&mut HitboxComponent, &mut AiStrategy)>()
    {
        if !enemies.contains(&entity) || hitbox.travel().is_some() {
            continue;
        }
        let ctx = AiContext {
            position: hitbox.origin(),
            velocity: hitbox.velocity(),
            max_speed: hitbox.max_speed(),
            target: player_origin,
            dt,
        };
        let update = strategy.update(&ctx, rng);
        hitbox.set_velocity(update.velocity);
        hitbox.set_acceleration(update.acceleration);
        if let Some(angle) = update.facing_angle {
            hitbox.set_last_faced_angle(angle);
        }
    }
}

/// Bend homing bullets toward their target while keeping their speed.
///
/// Enemy bullets home on the player; player bullets on the nearest enemy.
pub fn steer_homing_bullets(world: &mut World, player_origin: Option<Vec2>, enemies: &[Vec2]) {
    for (_entity, (hitbox, bullet, role)) in
        world.query_mut::<(&mut HitboxComponent, &Bullet, &EntityRole)>()
    {
        if bullet.attraction_lerp_factor == 0.0 {
            continue;
        }
        let target = match role {
            EntityRole::EnemyBullet => player_origin,
            EntityRole::PlayerBullet => nearest(enemies, hitbox.origin()),
            _ => None,
        };
        let Some(target) = target else {
            continue;
        };

        let heading = hitbox.velocity().normalize_or_zero();
        let desired = (target - hitbox.origin()).normalize_or_zero();
        let steered = heading
            .lerp(desired, bullet.attraction_lerp_factor.clamp(0.0, 1.0))
            .normalize_or_zero();
        if steered != Vec2::ZERO {
            hitbox.set_velocity(steered * bullet.speed);
        }
    }
}
