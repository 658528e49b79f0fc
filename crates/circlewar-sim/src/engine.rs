//! Simulation engine: the core of the game.
//!
//! `SimulationEngine` owns the hecs ECS world, the map areas, and every
//! per-tick queue. It processes player commands, runs all systems in a
//! fixed order, and produces `SimSnapshot`s. Completely headless, enabling
//! deterministic testing.

use std::collections::VecDeque;
use std::path::Path;

use glam::Vec2;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use circlewar_core::attack::BulletSpawn;
use circlewar_core::commands::PlayerCommand;
use circlewar_core::components::AreaMember;
use circlewar_core::constants::DT;
use circlewar_core::enums::GamePhase;
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::state::SimSnapshot;
use circlewar_core::types::{MapAreaId, SimTime};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::map_area::{find_mut, MapArea};
use crate::modifiers::MapAreaModifier;
use crate::persistence::{self, MapAreaSave, SaveData};
use crate::systems;
use crate::systems::removal::RemovalQueue;
use crate::world_setup::{self, entity_id, EnemyData, SpawnRequest};

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    world: World,
    config: SimConfig,
    time: SimTime,
    phase: GamePhase,
    rng: ChaCha8Rng,
    command_queue: VecDeque<PlayerCommand>,
    map_areas: Vec<MapArea>,
    focused_area: Option<MapAreaId>,
    player: Option<Entity>,
    spawn_queue: Vec<SpawnRequest>,
    removals: RemovalQueue,
    events: Vec<SimEvent>,
}

impl SimulationEngine {
    /// Create a new simulation engine with the given config.
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            time: SimTime::default(),
            phase: GamePhase::default(),
            command_queue: VecDeque::new(),
            map_areas: Vec::new(),
            focused_area: None,
            player: None,
            spawn_queue: Vec::new(),
            removals: RemovalQueue::default(),
            events: Vec::new(),
        }
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance by one nominal tick, scaled by the configured time scale.
    pub fn tick(&mut self) -> SimSnapshot {
        self.advance(DT * self.config.time_scale)
    }

    /// Advance the simulation by `dt` seconds and return the resulting snapshot.
    pub fn advance(&mut self, dt: f32) -> SimSnapshot {
        self.process_commands();

        if self.phase == GamePhase::Active {
            self.run_systems(dt);
            self.time.advance(dt);
        }

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.phase,
            self.focused_area(),
            events,
        )
    }

    /// Current state without advancing. Carries no events.
    pub fn snapshot(&self) -> SimSnapshot {
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.phase,
            self.focused_area(),
            Vec::new(),
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for scenario setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    pub fn map_area(&self, id: MapAreaId) -> Option<&MapArea> {
        self.map_areas.iter().find(|area| area.id == id)
    }

    pub fn focused_area_id(&self) -> Option<MapAreaId> {
        self.focused_area
    }

    pub fn focused_area(&self) -> Option<&MapArea> {
        self.focused_area.and_then(|id| self.map_area(id))
    }

    // --- Map areas ---

    /// Register a map area. `radius` defaults to the configured one.
    pub fn add_map_area(&mut self, center: Vec2, radius: Option<f32>) -> MapAreaId {
        let id = MapAreaId(self.map_areas.len() as u32);
        let radius = radius.unwrap_or(self.config.map_area_radius);
        self.map_areas.push(MapArea::new(id, center, radius));
        id
    }

    pub fn add_modifier(
        &mut self,
        area: MapAreaId,
        modifier: Box<dyn MapAreaModifier>,
    ) -> Result<(), SimError> {
        find_mut(&mut self.map_areas, area)
            .ok_or(SimError::UnknownMapArea(area))?
            .add_modifier(modifier);
        Ok(())
    }

    /// Focus an area directly, without any transit.
    pub fn focus_map_area(&mut self, area: MapAreaId) -> Result<(), SimError> {
        if self.map_area(area).is_none() {
            return Err(SimError::UnknownMapArea(area));
        }
        self.focused_area = Some(area);
        Ok(())
    }

    /// Move the player into another map area.
    ///
    /// Fires `on_player_leave` on the old area, refocuses, starts the
    /// player's travel to the new center, then fires `on_entity_enter`.
    pub fn enter_map_area(&mut self, area: MapAreaId) -> Result<(), SimError> {
        let player = self.player.ok_or(SimError::NoPlayer)?;
        let center = self
            .map_area(area)
            .map(|a| a.center)
            .ok_or(SimError::UnknownMapArea(area))?;

        if let Some(old) = self.focused_area {
            if let Some(old_area) = find_mut(&mut self.map_areas, old) {
                old_area.dispatch(
                    &mut self.world,
                    &mut self.spawn_queue,
                    &mut self.rng,
                    |modifier, ctx| modifier.on_player_leave(player, ctx),
                );
            }
        }

        self.focused_area = Some(area);
        if let Ok(mut hitbox) = self.world.get::<&mut HitboxComponent>(player) {
            hitbox.start_travel(center, self.config.travel_speed);
        }

        if let Some(new_area) = find_mut(&mut self.map_areas, area) {
            new_area.dispatch(
                &mut self.world,
                &mut self.spawn_queue,
                &mut self.rng,
                |modifier, ctx| modifier.on_entity_enter(player, ctx),
            );
        }
        self.events.push(SimEvent::MapAreaEntered { area });
        log::info!("player entering map area {:?} at {center}", area);
        Ok(())
    }

    // --- Entity creation ---

    /// Spawn the player from the configured player stats. Replaces any
    /// existing player.
    pub fn spawn_player(&mut self, position: Vec2) -> Result<Entity, SimError> {
        if let Some(old) = self.player.take() {
            log::warn!("replacing player {:?}", entity_id(old));
            let _ = self.world.despawn(old);
        }
        let entity = world_setup::spawn_player(&mut self.world, &self.config.player, position)?;
        self.player = Some(entity);

        if let Some(area) = self.focused_area {
            if let Some(area) = find_mut(&mut self.map_areas, area) {
                area.dispatch(
                    &mut self.world,
                    &mut self.spawn_queue,
                    &mut self.rng,
                    |modifier, ctx| modifier.on_entity_enter(entity, ctx),
                );
            }
        }
        Ok(entity)
    }

    /// Spawn an enemy into `area`, letting the area's modifiers rewrite its
    /// data first.
    pub fn spawn_enemy(&mut self, area: MapAreaId, data: EnemyData) -> Result<Entity, SimError> {
        let map_area =
            find_mut(&mut self.map_areas, area).ok_or(SimError::UnknownMapArea(area))?;

        let mut data = data;
        map_area.dispatch(
            &mut self.world,
            &mut self.spawn_queue,
            &mut self.rng,
            |modifier, ctx| modifier.on_enemy_data_creation(&mut data, ctx),
        );

        let entity = world_setup::spawn_enemy(&mut self.world, area, data)?;
        map_area.enemies.insert(entity);
        map_area.dispatch(
            &mut self.world,
            &mut self.spawn_queue,
            &mut self.rng,
            |modifier, ctx| modifier.on_entity_enter(entity, ctx),
        );
        Ok(entity)
    }

    /// Spawn a bullet immediately.
    pub fn spawn_bullet(&mut self, spawn: BulletSpawn) -> Result<Entity, SimError> {
        Ok(world_setup::spawn_bullet(&mut self.world, spawn)?)
    }

    // --- Commands ---

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Pause => {
                if self.phase == GamePhase::Active {
                    self.phase = GamePhase::Paused;
                }
            }
            PlayerCommand::Resume => {
                if self.phase == GamePhase::Paused {
                    self.phase = GamePhase::Active;
                }
            }
            PlayerCommand::SetVelocity { x, y } => {
                self.with_player_hitbox(|hitbox| {
                    if hitbox.travel().is_none() {
                        let max_speed = hitbox.max_speed();
                        hitbox.set_velocity(Vec2::new(x, y).clamp_length_max(max_speed));
                    }
                });
            }
            PlayerCommand::SetShooting { shooting } => {
                self.with_player_hitbox(|hitbox| hitbox.set_shooting(shooting));
            }
            PlayerCommand::SetFacing { angle } => {
                self.with_player_hitbox(|hitbox| hitbox.set_last_faced_angle(angle));
            }
        }
    }

    fn with_player_hitbox(&mut self, f: impl FnOnce(&mut HitboxComponent)) {
        let Some(player) = self.player else {
            log::debug!("ignoring player command: no player");
            return;
        };
        if let Ok(mut hitbox) = self.world.get::<&mut HitboxComponent>(player) {
            f(&mut hitbox);
        }
    }

    // --- Systems ---

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f32) {
        let focused = self
            .focused_area
            .and_then(|id| self.map_areas.iter().position(|area| area.id == id));

        // 1. Steering: travel, enemy AI, homing bullets
        systems::ai::run(
            &mut self.world,
            self.player,
            focused.map(|i| &self.map_areas[i].enemies),
            &mut self.rng,
            dt,
            &mut self.events,
        );
        // 2. Movement, collisions, boundaries
        if let Some(i) = focused {
            systems::movement::run(
                &mut self.world,
                &self.map_areas[i],
                &mut self.removals,
                &mut self.events,
            );
        }
        // 3. Circle deaths, fragmentation, entity deaths
        self.drain_removals();
        // 4. Attack clocks and bullet requests
        systems::shooting::run(
            &mut self.world,
            self.player,
            focused.map(|i| &self.map_areas[i]),
            self.config.map_area_radius,
            &mut self.rng,
            dt,
            &mut self.spawn_queue,
        );
        // 5. Bullet lifetimes
        systems::bullets::run(&mut self.world, dt, &mut self.removals);
        // 6. Area modifiers
        if let Some(i) = focused {
            self.map_areas[i].dispatch(
                &mut self.world,
                &mut self.spawn_queue,
                &mut self.rng,
                |modifier, ctx| modifier.update(dt, ctx),
            );
        }
        // 7. Materialize spawns, then drain what the later passes queued
        self.drain_spawns();
        self.drain_removals();
    }

    fn drain_removals(&mut self) {
        systems::removal::run(
            &mut self.world,
            &mut self.map_areas,
            &mut self.spawn_queue,
            &mut self.rng,
            &mut self.removals,
            &mut self.events,
            &mut self.player,
        );
    }

    /// Create everything requested during the tick. Requests queued while
    /// draining wait for the next tick.
    fn drain_spawns(&mut self) {
        for request in std::mem::take(&mut self.spawn_queue) {
            let result = match request {
                SpawnRequest::Bullet(spawn) => self.spawn_bullet(spawn).map(|_| ()),
                SpawnRequest::Enemy { area, data } => self.spawn_enemy(area, data).map(|_| ()),
            };
            if let Err(err) = result {
                log::warn!("dropped spawn request: {err}");
            }
        }
    }

    // --- Persistence ---

    /// Capture the world as a save.
    pub fn save_data(&self, slot_name: &str) -> SaveData {
        SaveData {
            slot_name: slot_name.to_string(),
            seed: self.config.seed,
            time: self.time,
            focused_area: self.focused_area,
            areas: self
                .map_areas
                .iter()
                .map(|area| MapAreaSave {
                    id: area.id,
                    center: area.center,
                    radius: area.radius,
                })
                .collect(),
            player: self.player.map(entity_id),
            entities: persistence::capture_entities(&self.world),
        }
    }

    /// Replace the world with a save.
    ///
    /// Registered areas keep their modifiers; areas missing from this engine
    /// are recreated bare. The RNG restarts from the seed mixed with the
    /// saved tick.
    pub fn load_save(&mut self, data: &SaveData) -> Result<(), SimError> {
        self.world.clear();
        self.command_queue.clear();
        self.spawn_queue.clear();
        self.removals.clear();
        self.events.clear();

        for saved in &data.areas {
            match find_mut(&mut self.map_areas, saved.id) {
                Some(area) => {
                    area.center = saved.center;
                    area.radius = saved.radius;
                    area.enemies.clear();
                }
                None => self
                    .map_areas
                    .push(MapArea::new(saved.id, saved.center, saved.radius)),
            }
        }

        let ids = persistence::restore_entities(&mut self.world, &data.entities)?;
        for (entity, member) in self.world.query::<&AreaMember>().iter() {
            if let Some(area) = find_mut(&mut self.map_areas, member.0) {
                area.enemies.insert(entity);
            }
        }

        self.player = data.player.and_then(|id| ids.get(&id).copied());
        self.focused_area = data.focused_area;
        self.time = data.time;
        self.phase = GamePhase::Active;
        self.rng = ChaCha8Rng::seed_from_u64(data.seed ^ data.time.tick);
        log::info!(
            "loaded save {:?}: {} entities at tick {}",
            data.slot_name,
            data.entities.len(),
            data.time.tick
        );
        Ok(())
    }

    pub fn save_to_file(&self, dir: &Path, slot: &str) -> Result<(), SimError> {
        persistence::save_to_file(dir, slot, &self.save_data(slot))
    }

    pub fn load_from_file(&mut self, dir: &Path, slot: &str) -> Result<(), SimError> {
        let data = persistence::load_from_file(dir, slot)?;
        self.load_save(&data)
    }
}
