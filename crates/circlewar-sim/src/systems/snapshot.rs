//! Snapshot system: queries the ECS world and builds a complete SimSnapshot.
//!
//! This system is read-only; it never modifies the world.

use hecs::World;

use circlewar_core::components::Boss;
use circlewar_core::enums::{EntityRole, GamePhase};
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::state::{CircleView, EntityView, SimSnapshot};
use circlewar_core::types::{normalize_angle, SimTime};

use crate::map_area::MapArea;
use crate::world_setup::entity_id;

/// Build a SimSnapshot from the current world state.
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    phase: GamePhase,
    area: Option<&MapArea>,
    events: Vec<SimEvent>,
) -> SimSnapshot {
    SimSnapshot {
        time: *time,
        phase,
        map_area: area.map(MapArea::view),
        entities: build_entities(world),
        events,
    }
}

fn build_entities(world: &World) -> Vec<EntityView> {
    let mut entities: Vec<EntityView> = world
        .query::<(&HitboxComponent, &EntityRole, Option<&Boss>)>()
        .iter()
        .map(|(entity, (hitbox, role, boss))| EntityView {
            id: entity_id(entity),
            role: *role,
            boss: boss.is_some(),
            origin: hitbox.origin(),
            facing_angle: normalize_angle(hitbox.last_faced_angle()),
            intangible: hitbox.is_intangible(),
            circles: hitbox
                .circles()
                .iter()
                .map(|circle| CircleView {
                    id: circle.id(),
                    center: hitbox.circle_world_position(circle),
                    radius: circle.radius(),
                    health: circle.health(),
                    max_health: circle.max_health(),
                    color: circle.color().clone(),
                })
                .collect(),
        })
        .collect();
    entities.sort_by_key(|view| view.id);
    entities
}
