//! Movement and collision resolution for the focused map area.
//!
//! Every moving body gets a candidate origin `origin + velocity`. Collisions
//! and boundary checks run against candidates only, and a body commits its
//! move only when nothing happened to it this frame. A bullet and the circle
//! it strikes therefore both stay where they were on the frame of the hit.

use glam::Vec2;
use hecs::{Entity, World};

use circlewar_core::components::Bullet;
use circlewar_core::enums::EntityRole;
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::types::{angle_to, circles_overlap, CircleId};

use super::removal::{RemovalQueue, RemovalReason};
use crate::collision::{Contact, ContactEffect, CustomCollision};
use crate::map_area::MapArea;
use crate::world_setup::{entity_from_id, entity_id};

/// Candidate state of one body for this frame.
struct Body {
    entity: Entity,
    role: EntityRole,
    intangible: bool,
    candidate: Vec2,
    /// Circle id, offset from origin, radius.
    circles: Vec<(CircleId, Vec2, f32)>,
}

struct BulletHit {
    bullet: usize,
    target: usize,
    circle: CircleId,
}

struct BodyContact {
    a: usize,
    a_circle: CircleId,
    b: usize,
    b_circle: CircleId,
}

/// First pair of overlapping circles between two bodies at their candidate
/// positions. Intangible bodies never overlap.
fn first_overlap(a: &Body, b: &Body) -> Option<(CircleId, CircleId)> {
    if a.intangible || b.intangible {
        return None;
    }
    for &(a_id, a_offset, a_radius) in &a.circles {
        for &(b_id, b_offset, b_radius) in &b.circles {
            if circles_overlap(
                a.candidate + a_offset,
                a_radius,
                b.candidate + b_offset,
                b_radius,
            ) {
                return Some((a_id, b_id));
            }
        }
    }
    None
}

/// Resolve one frame of movement inside `area`.
///
/// Enemies outside `area.enemies` neither move nor collide.
pub fn run(
    world: &mut World,
    area: &MapArea,
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
) {
    let bodies = collect_bodies(world, area);
    let mut blocked = vec![false; bodies.len()];

    let by_role = |role: EntityRole| -> Vec<usize> {
        (0..bodies.len()).filter(|&i| bodies[i].role == role).collect()
    };
    let players = by_role(EntityRole::Player);
    let enemies = by_role(EntityRole::Enemy);
    let player_bullets = by_role(EntityRole::PlayerBullet);
    let enemy_bullets = by_role(EntityRole::EnemyBullet);

    // Player <-> enemy body contact.
    let mut contacts = Vec::new();
    for &p in &players {
        for &e in &enemies {
            if let Some((p_circle, e_circle)) = first_overlap(&bodies[p], &bodies[e]) {
                blocked[p] = true;
                blocked[e] = true;
                contacts.push(BodyContact {
                    a: p,
                    a_circle: p_circle,
                    b: e,
                    b_circle: e_circle,
                });
            }
        }
    }

    // Bullets against the side they can hurt. Each bullet strikes at most once.
    let mut hits = Vec::new();
    for &b in enemy_bullets.iter().chain(&player_bullets) {
        for &t in players.iter().chain(&enemies) {
            if !bodies[t].role.is_hit_by(bodies[b].role) {
                continue;
            }
            if let Some((_, circle)) = first_overlap(&bodies[b], &bodies[t]) {
                blocked[b] = true;
                blocked[t] = true;
                hits.push(BulletHit {
                    bullet: b,
                    target: t,
                    circle,
                });
                break;
            }
        }
    }

    check_boundaries(area, &bodies, &mut blocked, removals, events);
    apply_hits(world, &bodies, &hits, removals, events);
    apply_contacts(world, &bodies, &contacts);

    for (i, body) in bodies.iter().enumerate() {
        if blocked[i] {
            continue;
        }
        if let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(body.entity) {
            hitbox.commit_movement(body.candidate, !body.role.is_bullet());
        }
    }
}

fn collect_bodies(world: &World, area: &MapArea) -> Vec<Body> {
    let mut bodies = Vec::new();
    for (entity, (hitbox, role)) in world.query::<(&HitboxComponent, &EntityRole)>().iter() {
        if *role == EntityRole::Enemy && !area.enemies.contains(&entity) {
            continue;
        }
        bodies.push(Body {
            entity,
            role: *role,
            intangible: hitbox.is_intangible(),
            candidate: hitbox.origin() + hitbox.velocity(),
            circles: hitbox
                .circles()
                .iter()
                .map(|c| (c.id(), c.position(), c.radius()))
                .collect(),
        });
    }
    bodies
}

/// Players and enemies stay inside the area circle; tangible ones pushing
/// past it are held back and request a transition. Bullets live inside the
/// area's bounding square and are removed once they leave it.
fn check_boundaries(
    area: &MapArea,
    bodies: &[Body],
    blocked: &mut [bool],
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
) {
    for (i, body) in bodies.iter().enumerate() {
        if body.role.is_bullet() {
            let d = (body.candidate - area.center).abs();
            if d.x > area.radius || d.y > area.radius {
                blocked[i] = true;
                removals.push(body.entity, RemovalReason::OutOfBounds);
            }
        } else if !body.intangible && !area.contains_point(body.candidate) {
            blocked[i] = true;
            events.push(SimEvent::MapAreaTransitionRequested {
                entity: entity_id(body.entity),
                role: body.role,
                angle: angle_to(area.center, body.candidate),
            });
        }
    }
}

/// Damage struck circles, spend the bullets, and pay out lifesteal.
fn apply_hits(
    world: &mut World,
    bodies: &[Body],
    hits: &[BulletHit],
    removals: &mut RemovalQueue,
    events: &mut Vec<SimEvent>,
) {
    for hit in hits {
        let bullet_entity = bodies[hit.bullet].entity;
        let target_entity = bodies[hit.target].entity;
        let Ok(bullet) = world.get::<&Bullet>(bullet_entity).map(|b| *b) else {
            continue;
        };
        removals.push(bullet_entity, RemovalReason::Spent);

        damage_circle(world, target_entity, hit.circle, bullet.damage);
        events.push(SimEvent::BulletHit {
            bullet: entity_id(bullet_entity),
            target: entity_id(target_entity),
            circle: hit.circle,
            damage: bullet.damage,
        });

        let heal = bullet.damage * bullet.lifesteal_percent;
        if heal > 0.0 {
            let shooter = bullet.source.and_then(entity_from_id);
            if let Some(shooter) = shooter {
                if let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(shooter) {
                    hitbox.heal(heal);
                }
            }
        }
    }
}

/// Subtract health from one circle and queue it for removal once dead.
fn damage_circle(world: &mut World, entity: Entity, circle: CircleId, amount: f32) {
    let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(entity) else {
        return;
    };
    let dead = match hitbox.circle_mut(circle) {
        Some(c) => c.damage(amount),
        None => false,
    };
    if dead {
        hitbox.queue_circle_removal(circle);
    }
}

/// Run custom collision callbacks on both sides of every contact, then
/// apply what they asked for.
fn apply_contacts(world: &mut World, bodies: &[Body], contacts: &[BodyContact]) {
    let mut effects = Vec::new();
    for contact in contacts {
        let a = &bodies[contact.a];
        let b = &bodies[contact.b];
        let sides = [
            (a, contact.a_circle, b, contact.b_circle),
            (b, contact.b_circle, a, contact.a_circle),
        ];
        for (this, this_circle, other, other_circle) in sides {
            let Ok(callback) = world.get::<&CustomCollision>(this.entity) else {
                continue;
            };
            callback.0.on_contact(
                &Contact {
                    this: this.entity,
                    this_role: this.role,
                    this_circle,
                    this_origin: this.candidate,
                    other: other.entity,
                    other_role: other.role,
                    other_circle,
                    other_origin: other.candidate,
                },
                &mut effects,
            );
        }
    }

    for effect in effects {
        match effect {
            ContactEffect::Damage {
                target,
                circle,
                amount,
            } => damage_circle(world, target, circle, amount),
            ContactEffect::Knockback { target, impulse } => {
                if let Ok(mut hitbox) = world.get::<&mut HitboxComponent>(target) {
                    let velocity = hitbox.velocity() + impulse;
                    hitbox.set_velocity(velocity);
                }
            }
        }
    }
}
