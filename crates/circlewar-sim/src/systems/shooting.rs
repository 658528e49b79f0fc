//! Shooting system: advances attack clocks and requests bullets.
//!
//! The player aims at the nearest enemy of the focused area; enemies aim at
//! the player. Bullets are not spawned here; each fired part becomes a
//! `SpawnRequest` drained after the pass.

use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;

use circlewar_core::attack::FireRequest;
use circlewar_core::constants::{ENEMY_BULLET_COLOR, PLAYER_BULLET_COLOR};
use circlewar_core::enums::EntityRole;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::types::ColorTag;

use super::{enemy_origins, nearest, origin_of};
use crate::map_area::MapArea;
use crate::world_setup::{entity_id, SpawnRequest};

/// Tick every shooting hitbox's attack patterns by `dt`.
///
/// Without a focused area only the player shoots, with bullet lifetimes
/// bounded by `fallback_radius`.
pub fn run(
    world: &mut World,
    player: Option<Entity>,
    area: Option<&MapArea>,
    fallback_radius: f32,
    rng: &mut ChaCha8Rng,
    dt: f32,
    spawns: &mut Vec<SpawnRequest>,
) {
    let player_origin = origin_of(world, player);
    let targets = area
        .map(|area| enemy_origins(world, &area.enemies))
        .unwrap_or_default();
    let map_area_radius = area.map_or(fallback_radius, |area| area.radius);

    for (entity, (hitbox, role)) in world.query_mut::<(&mut HitboxComponent, &EntityRole)>() {
        let is_player = match role {
            EntityRole::Player => true,
            EntityRole::Enemy => false,
            _ => continue,
        };
        if !is_player && !area.is_some_and(|area| area.enemies.contains(&entity)) {
            continue;
        }
        if !hitbox.is_shooting() || hitbox.travel().is_some() {
            continue;
        }

        let origin = hitbox.origin();
        let target = if is_player {
            nearest(&targets, origin)
        } else {
            player_origin
        };
        let facing_angle = hitbox.last_faced_angle();
        let default_color = ColorTag::new(if is_player {
            PLAYER_BULLET_COLOR
        } else {
            ENEMY_BULLET_COLOR
        });

        for circle in hitbox.circles_mut() {
            let due = circle.tick_attack(dt);
            if due.is_empty() {
                continue;
            }
            let Some(attack) = circle.attack() else {
                continue;
            };
            let request = FireRequest {
                source: Some(entity_id(entity)),
                source_is_player: is_player,
                target,
                origin: origin + circle.position(),
                facing_angle,
                map_area_radius,
                default_color: default_color.clone(),
            };
            for index in due {
                match attack.pattern().parts()[index].fire(&request, rng) {
                    Ok(spawn) => spawns.push(SpawnRequest::Bullet(spawn)),
                    Err(err) => {
                        log::debug!("{:?} skipped attack part {index}: {err}", entity_id(entity))
                    }
                }
            }
        }
    }
}
