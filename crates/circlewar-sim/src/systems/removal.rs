//! Removal system: drains queued circle and entity removals.
//!
//! Circle removals come first. Each dead circle fires its area's
//! circle-death hooks while it still exists, then is removed. A hitbox left
//! with no circles is queued for entity removal; a surviving enemy hitbox is
//! checked for fragmentation. Entity removals then fire death hooks, update
//! the area's enemy set, and despawn.

use glam::Vec2;
use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;

use circlewar_ai::AiStrategy;
use circlewar_core::components::AreaMember;
use circlewar_core::enums::EntityRole;
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::types::MapAreaId;

use crate::collision::CustomCollision;
use crate::map_area::{find_mut, MapArea};
use crate::world_setup::{entity_id, SpawnRequest, SubEntityStats};

/// Why an entity is leaving the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Lost its last circle.
    Destroyed,
    /// A bullet that struck something.
    Spent,
    /// Lifetime ran out.
    Expired,
    /// A bullet that left the area.
    OutOfBounds,
}

/// Entities waiting to be despawned. Queuing an entity twice is a no-op.
#[derive(Debug, Default)]
pub struct RemovalQueue {
    entries: Vec<(Entity, RemovalReason)>,
}

impl RemovalQueue {
    pub fn push(&mut self, entity: Entity, reason: RemovalReason) {
        if !self.contains(entity) {
            self.entries.push((entity, reason));
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.iter().any(|(e, _)| *e == entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn take(&mut self) -> Vec<(Entity, RemovalReason)> {
        std::mem::take(&mut self.entries)
    }
}

/// Drain every pending circle removal, then every queued entity removal.
#[allow(clippy::too_many_arguments)]
pub fn run(
    world: &mut World,
    areas: &mut [MapArea],
    spawns: &mut Vec<SpawnRequest>,
    rng: &mut ChaCha8Rng,
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
    player: &mut Option<Entity>,
) {
    drain_circles(world, areas, spawns, rng, removals, events);
    drain_entities(world, areas, spawns, rng, removals, events, player);
}

fn area_of(world: &World, entity: Entity) -> Option<MapAreaId> {
    world.get::<&AreaMember>(entity).ok().map(|member| member.0)
}

fn area_mut(areas: &mut [MapArea], id: Option<MapAreaId>) -> Option<&mut MapArea> {
    find_mut(areas, id?)
}

fn drain_circles(
    world: &mut World,
    areas: &mut [MapArea],
    spawns: &mut Vec<SpawnRequest>,
    rng: &mut ChaCha8Rng,
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
) {
    let pending: Vec<(Entity, EntityRole)> = world
        .query::<(&HitboxComponent, &EntityRole)>()
        .iter()
        .filter(|(_, (hitbox, _))| hitbox.has_pending_removals())
        .map(|(entity, (_, role))| (entity, *role))
        .collect();

    for (entity, role) in pending {
        let ids = match world.get::<&mut HitboxComponent>(entity) {
            Ok(mut hitbox) => hitbox.take_pending_removals(),
            Err(_) => continue,
        };
        let area_id = area_of(world, entity);

        for id in ids {
            if role == EntityRole::Enemy {
                if let Some(area) = area_mut(areas, area_id) {
                    area.dispatch(world, spawns, rng, |modifier, ctx| {
                        modifier.on_enemy_circle_death(entity, id, ctx)
                    });
                }
            }
            if let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(entity) {
                if let Some(circle) = hitbox.remove_circle(id) {
                    let position = hitbox.circle_world_position(&circle);
                    events.push(SimEvent::CircleDestroyed {
                        entity: entity_id(entity),
                        circle: id,
                        position,
                    });
                }
            }
        }

        let remaining = world
            .get::<&HitboxComponent>(entity)
            .map(|hitbox| hitbox.circle_count())
            .unwrap_or(0);
        if remaining == 0 {
            removals.push(entity, RemovalReason::Destroyed);
        } else if role == EntityRole::Enemy {
            fragment(world, entity, areas, events);
        }
    }
}

/// Peel disconnected circle groups off `entity` until it is one connected piece.
pub fn fragment(
    world: &mut World,
    entity: Entity,
    areas: &mut [MapArea],
    events: &mut Vec<SimEvent>,
) -> Vec<Entity> {
    let mut children = Vec::new();
    loop {
        let piece = {
            let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(entity) else {
                break;
            };
            let Some(group) = hitbox.find_split_group() else {
                break;
            };
            let piece = hitbox.split_off(&group);
            hitbox.recenter_original_circle_positions();
            piece
        };
        children.push(spawn_piece(world, entity, piece));
    }

    if children.is_empty() {
        return children;
    }

    if let Some(area) = area_mut(areas, area_of(world, entity)) {
        area.enemies.extend(children.iter().copied());
    }
    log::debug!(
        "{:?} split into {} extra piece(s)",
        entity_id(entity),
        children.len()
    );
    events.push(SimEvent::EntitySplit {
        parent: entity_id(entity),
        children: children.iter().map(|&child| entity_id(child)).collect(),
    });
    children
}

/// Spawn a peeled-off piece as an enemy of its own.
fn spawn_piece(world: &mut World, parent: Entity, mut piece: HitboxComponent) -> Entity {
    let stats = world
        .get::<&SubEntityStats>(parent)
        .ok()
        .map(|stats| (*stats).clone());
    let parent_ai = world
        .get::<&AiStrategy>(parent)
        .ok()
        .map(|ai| (*ai).clone());
    let member = world.get::<&AreaMember>(parent).ok().map(|member| *member);
    let collision = world
        .get::<&CustomCollision>(parent)
        .ok()
        .map(|collision| (*collision).clone());

    let ai = match &stats {
        Some(stats) => {
            piece.set_max_speed(stats.max_speed);
            stats.ai.clone().or(parent_ai)
        }
        None => parent_ai,
    };
    piece.set_acceleration(Vec2::ZERO);

    let child = world.spawn((piece, EntityRole::Enemy));
    if let Some(ai) = ai {
        let _ = world.insert_one(child, ai);
    }
    if let Some(member) = member {
        let _ = world.insert_one(child, member);
    }
    if let Some(stats) = stats {
        let _ = world.insert_one(child, stats);
    }
    if let Some(collision) = collision {
        let _ = world.insert_one(child, collision);
    }
    child
}

#[allow(clippy::too_many_arguments)]
fn drain_entities(
    world: &mut World,
    areas: &mut [MapArea],
    spawns: &mut Vec<SpawnRequest>,
    rng: &mut ChaCha8Rng,
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
    player: &mut Option<Entity>,
) {
    for (entity, reason) in removals.take() {
        if !world.contains(entity) {
            continue;
        }
        let role = world.get::<&EntityRole>(entity).ok().map(|role| *role);
        let position = world
            .get::<&HitboxComponent>(entity)
            .map(|hitbox| hitbox.origin())
            .unwrap_or(Vec2::ZERO);

        if role == Some(EntityRole::Enemy) {
            if let Some(area) = area_mut(areas, area_of(world, entity)) {
                if reason == RemovalReason::Destroyed {
                    area.dispatch(world, spawns, rng, |modifier, ctx| {
                        modifier.on_enemy_death(entity, ctx)
                    });
                }
                area.enemies.remove(&entity);
            }
        }

        let _ = world.despawn(entity);

        match (reason, role) {
            (RemovalReason::Destroyed, Some(role)) => {
                events.push(SimEvent::EntityDestroyed {
                    entity: entity_id(entity),
                    role,
                    position,
                });
            }
            (RemovalReason::Expired, _) => {
                events.push(SimEvent::BulletExpired {
                    bullet: entity_id(entity),
                });
            }
            _ => {}
        }

        if *player == Some(entity) {
            log::info!("player {:?} destroyed", entity_id(entity));
            *player = None;
        }
    }
}
