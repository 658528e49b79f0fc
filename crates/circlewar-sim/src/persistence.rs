//! Save files: the world as plain serializable data.
//!
//! Modifiers, custom collision callbacks, and in-progress travel are not
//! saved. Areas that already exist in the loading engine keep their
//! modifiers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use circlewar_ai::AiStrategy;
use circlewar_core::components::{AreaMember, Boss, Bullet, Lifetime};
use circlewar_core::enums::EntityRole;
use circlewar_core::hitbox::{HitboxComponent, HitboxSave};
use circlewar_core::types::{EntityId, MapAreaId, SimTime};

use crate::error::SimError;
use crate::world_setup::{entity_id, SubEntityStats};

/// Full save data written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub slot_name: String,
    pub seed: u64,
    pub time: SimTime,
    pub focused_area: Option<MapAreaId>,
    pub areas: Vec<MapAreaSave>,
    pub player: Option<EntityId>,
    pub entities: Vec<EntitySave>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapAreaSave {
    pub id: MapAreaId,
    pub center: Vec2,
    pub radius: f32,
}

/// One entity. `id` is only meaningful inside the save it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySave {
    pub id: EntityId,
    pub role: EntityRole,
    #[serde(default)]
    pub boss: bool,
    pub area: Option<MapAreaId>,
    pub hitbox: HitboxSave,
    pub velocity: Vec2,
    #[serde(default)]
    pub acceleration: Vec2,
    pub ai: Option<AiStrategy>,
    pub sub_entity_stats: Option<SubEntityStats>,
    pub bullet: Option<Bullet>,
    pub lifetime: Option<Lifetime>,
}

/// Lightweight metadata for listing saves without loading full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub slot_name: String,
    pub tick: u64,
    pub entity_count: usize,
}

/// Capture every hitbox-bearing entity, ordered by id.
pub fn capture_entities(world: &World) -> Vec<EntitySave> {
    let mut query = world.query::<(
        &HitboxComponent,
        &EntityRole,
        Option<&Boss>,
        Option<&AreaMember>,
        Option<&AiStrategy>,
        Option<&SubEntityStats>,
        Option<&Bullet>,
        Option<&Lifetime>,
    )>();
    let mut entities: Vec<EntitySave> = query
        .iter()
        .map(
            |(entity, (hitbox, role, boss, area, ai, stats, bullet, lifetime))| EntitySave {
                id: entity_id(entity),
                role: *role,
                boss: boss.is_some(),
                area: area.map(|member| member.0),
                hitbox: hitbox.to_save(),
                velocity: hitbox.velocity(),
                acceleration: hitbox.acceleration(),
                ai: ai.cloned(),
                sub_entity_stats: stats.cloned(),
                bullet: bullet.copied(),
                lifetime: lifetime.copied(),
            },
        )
        .collect();
    entities.sort_by_key(|save| save.id);
    entities
}

/// Spawn saved entities into `world`. Returns the saved id of each entity
/// mapped to its new handle; bullet sources are rewritten through it.
pub fn restore_entities(
    world: &mut World,
    saves: &[EntitySave],
) -> Result<BTreeMap<EntityId, Entity>, SimError> {
    let mut ids = BTreeMap::new();
    for save in saves {
        let mut hitbox = HitboxComponent::from_save(&save.hitbox)?;
        hitbox.set_velocity(save.velocity);
        hitbox.set_acceleration(save.acceleration);

        let entity = world.spawn((hitbox, save.role));
        if save.boss {
            let _ = world.insert_one(entity, Boss);
        }
        if let Some(area) = save.area {
            let _ = world.insert_one(entity, AreaMember(area));
        }
        if let Some(ai) = &save.ai {
            let _ = world.insert_one(entity, ai.clone());
        }
        if let Some(stats) = &save.sub_entity_stats {
            let _ = world.insert_one(entity, stats.clone());
        }
        if let Some(lifetime) = save.lifetime {
            let _ = world.insert_one(entity, lifetime);
        }
        ids.insert(save.id, entity);
    }

    for save in saves {
        let (Some(bullet), Some(&entity)) = (save.bullet, ids.get(&save.id)) else {
            continue;
        };
        let source = bullet
            .source
            .and_then(|old| ids.get(&old))
            .map(|&new| entity_id(new));
        let _ = world.insert_one(entity, Bullet { source, ..bullet });
    }
    Ok(ids)
}

fn save_path(dir: &Path, slot: &str) -> PathBuf {
    dir.join(format!("{}.json", slot))
}

pub fn save_to_file(dir: &Path, slot: &str, data: &SaveData) -> Result<(), SimError> {
    fs::create_dir_all(dir)?;
    let path = save_path(dir, slot);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, json)?;
    log::info!("saved slot {slot:?} to {}", path.display());
    Ok(())
}

pub fn load_from_file(dir: &Path, slot: &str) -> Result<SaveData, SimError> {
    let path = save_path(dir, slot);
    let json = fs::read_to_string(&path)?;
    let data: SaveData = serde_json::from_str(&json)?;
    Ok(data)
}

pub fn list_saves(dir: &Path) -> Vec<SaveMetadata> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut saves = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let Ok(json) = fs::read_to_string(&path) else {
            continue;
        };
        match serde_json::from_str::<SaveData>(&json) {
            Ok(data) => saves.push(SaveMetadata {
                slot_name: data.slot_name,
                tick: data.time.tick,
                entity_count: data.entities.len(),
            }),
            Err(err) => log::warn!("skipping unreadable save {}: {err}", path.display()),
        }
    }
    saves.sort_by(|a, b| a.slot_name.cmp(&b.slot_name));
    saves
}

pub fn delete_save(dir: &Path, slot: &str) -> Result<(), SimError> {
    let path = save_path(dir, slot);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}
