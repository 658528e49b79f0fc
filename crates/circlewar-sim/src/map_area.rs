//! Map areas: bounded regions holding one cohort of enemies.

use std::collections::BTreeSet;

use glam::Vec2;
use hecs::{Entity, World};
use rand_chacha::ChaCha8Rng;

use circlewar_core::state::MapAreaView;
use circlewar_core::types::MapAreaId;

use crate::modifiers::{MapAreaModifier, ModifierContext};
use crate::world_setup::SpawnRequest;

#[derive(Debug)]
pub struct MapArea {
    pub id: MapAreaId,
    pub center: Vec2,
    pub radius: f32,
    /// Live enemies belonging to this area. Only these move and shoot
    /// while the area is focused.
    pub enemies: BTreeSet<Entity>,
    modifiers: Vec<Box<dyn MapAreaModifier>>,
}

impl MapArea {
    pub fn new(id: MapAreaId, center: Vec2, radius: f32) -> Self {
        Self {
            id,
            center,
            radius,
            enemies: BTreeSet::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn add_modifier(&mut self, modifier: Box<dyn MapAreaModifier>) {
        log::debug!("area {:?}: attached modifier {}", self.id, modifier.name());
        self.modifiers.push(modifier);
    }

    pub fn modifier_names(&self) -> Vec<&str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.distance(self.center) <= self.radius
    }

    /// Run `hook` on every modifier, in attachment order.
    pub fn dispatch(
        &mut self,
        world: &mut World,
        spawns: &mut Vec<SpawnRequest>,
        rng: &mut ChaCha8Rng,
        mut hook: impl FnMut(&mut dyn MapAreaModifier, &mut ModifierContext),
    ) {
        let MapArea {
            center,
            radius,
            enemies,
            modifiers,
            ..
        } = self;
        let mut ctx = ModifierContext {
            world,
            spawns,
            rng,
            area_center: *center,
            area_radius: *radius,
            enemies,
        };
        for modifier in modifiers.iter_mut() {
            hook(modifier.as_mut(), &mut ctx);
        }
    }

    pub fn view(&self) -> MapAreaView {
        MapAreaView {
            id: self.id,
            center: self.center,
            radius: self.radius,
            enemy_count: self.enemies.len(),
        }
    }
}

/// Find an area by id.
pub fn find_mut(areas: &mut [MapArea], id: MapAreaId) -> Option<&mut MapArea> {
    areas.iter_mut().find(|area| area.id == id)
}
