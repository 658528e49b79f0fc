//! Bullet lifetime countdown.

use hecs::World;

use circlewar_core::components::Lifetime;

use super::removal::{RemovalQueue, RemovalReason};

/// Count down lifetimes and queue expired entities for removal.
pub fn run(world: &mut World, dt: f32, removals: &mut RemovalQueue) {
    for (entity, lifetime) in world.query_mut::<&mut Lifetime>() {
        lifetime.remaining_secs -= dt;
        if lifetime.remaining_secs <= 0.0 {
            removals.push(entity, RemovalReason::Expired);
        }
    }
}
