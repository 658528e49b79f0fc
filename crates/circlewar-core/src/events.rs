//! Events emitted by the simulation for rendering, audio and UI feedback.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::EntityRole;
use crate::types::{CircleId, EntityId, MapAreaId};

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A bullet struck a circle.
    BulletHit {
        bullet: EntityId,
        target: EntityId,
        circle: CircleId,
        damage: f32,
    },
    /// A circle's health reached zero and it was removed.
    CircleDestroyed {
        entity: EntityId,
        circle: CircleId,
        position: Vec2,
    },
    /// An entity lost its last circle.
    EntityDestroyed {
        entity: EntityId,
        role: EntityRole,
        position: Vec2,
    },
    /// A hitbox came apart into independent pieces.
    EntitySplit {
        parent: EntityId,
        children: Vec<EntityId>,
    },
    /// A body pressed against the map area boundary.
    MapAreaTransitionRequested {
        entity: EntityId,
        role: EntityRole,
        /// Angle from the area center to the body.
        angle: f32,
    },
    /// A player or enemy arrived at its travel destination.
    TravelCompleted { entity: EntityId },
    /// A bullet reached the end of its lifetime.
    BulletExpired { bullet: EntityId },
    /// The focused map area changed.
    MapAreaEntered { area: MapAreaId },
}
