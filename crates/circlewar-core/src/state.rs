//! Game state snapshot: the complete visible state handed to the renderer each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityRole, GamePhase};
use crate::events::SimEvent;
use crate::types::{CircleId, ColorTag, EntityId, MapAreaId, SimTime};

/// Complete renderable state after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub map_area: Option<MapAreaView>,
    /// Sorted by entity id.
    pub entities: Vec<EntityView>,
    pub events: Vec<SimEvent>,
}

impl SimSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn count_role(&self, role: EntityRole) -> usize {
        self.entities.iter().filter(|e| e.role == role).count()
    }
}

/// The focused map area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapAreaView {
    pub id: MapAreaId,
    pub center: Vec2,
    pub radius: f32,
    pub enemy_count: usize,
}

/// One entity on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub role: EntityRole,
    pub boss: bool,
    pub origin: Vec2,
    pub facing_angle: f32,
    pub intangible: bool,
    pub circles: Vec<CircleView>,
}

/// One circle in world space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleView {
    pub id: CircleId,
    pub center: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: ColorTag,
}
