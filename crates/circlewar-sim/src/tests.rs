//! Tests for the simulation engine: movement, collision, fragmentation,
//! map areas, modifiers, travel, and persistence.

use std::sync::{Arc, Mutex};

use glam::Vec2;
use hecs::Entity;

use circlewar_ai::AiStrategy;
use circlewar_core::attack::BulletSpawn;
use circlewar_core::commands::PlayerCommand;
use circlewar_core::constants::DT;
use circlewar_core::enums::{EntityRole, GamePhase};
use circlewar_core::error::HitboxError;
use circlewar_core::events::SimEvent;
use circlewar_core::hitbox::HitboxComponent;
use circlewar_core::types::{CircleId, ColorTag, MapAreaId};

use crate::collision::{ContactKnockback, CustomCollision};
use crate::config::SimConfig;
use crate::engine::SimulationEngine;
use crate::error::SimError;
use crate::modifiers::{
    DeathBurst, EntryGrace, MapAreaModifier, ModifierContext, Regeneration, StatScaling,
};
use crate::scenario::{self, ScenarioId};
use crate::world_setup::{entity_id, CircleSpec, EnemyData};

fn engine_with_area(radius: f32) -> (SimulationEngine, MapAreaId) {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let area = engine.add_map_area(Vec2::ZERO, Some(radius));
    engine.focus_map_area(area).unwrap();
    (engine, area)
}

/// An enemy that never moves: zero max speed, so following yields no velocity.
fn stationary_enemy(position: Vec2) -> EnemyData {
    EnemyData::new(position, 0.0, AiStrategy::follow())
}

fn bullet(role: EntityRole, origin: Vec2, velocity: Vec2, radius: f32, damage: f32) -> BulletSpawn {
    BulletSpawn {
        source: None,
        role,
        origin,
        velocity,
        radius,
        color: ColorTag::new("test"),
        damage,
        lifesteal_percent: 0.0,
        attraction_lerp_factor: 0.0,
        lifetime_secs: None,
    }
}

fn hitbox(engine: &SimulationEngine, entity: Entity) -> HitboxComponent {
    engine
        .world()
        .get::<&HitboxComponent>(entity)
        .map(|h| (*h).clone())
        .unwrap()
}

fn close(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-3
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut engine_a = SimulationEngine::new(SimConfig {
        seed: 12345,
        ..Default::default()
    });
    let mut engine_b = SimulationEngine::new(SimConfig {
        seed: 12345,
        ..Default::default()
    });
    scenario::build_scenario(&mut engine_a, ScenarioId::Twin).unwrap();
    scenario::build_scenario(&mut engine_b, ScenarioId::Twin).unwrap();

    for _ in 0..300 {
        let json_a = serde_json::to_string(&engine_a.tick()).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = SimulationEngine::new(SimConfig {
        seed: 111,
        ..Default::default()
    });
    let mut engine_b = SimulationEngine::new(SimConfig {
        seed: 222,
        ..Default::default()
    });
    scenario::build_scenario(&mut engine_a, ScenarioId::Twin).unwrap();
    scenario::build_scenario(&mut engine_b, ScenarioId::Twin).unwrap();

    // Twin pods fire with a random spread, so bullets diverge early.
    let mut diverged = false;
    for _ in 0..120 {
        let json_a = serde_json::to_string(&engine_a.tick()).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick()).unwrap();
        if json_a != json_b {
            diverged = true;
            break;
        }
    }
    assert!(diverged, "Different seeds should produce divergent output");
}

#[test]
fn test_every_scenario_builds_and_runs() {
    for id in ScenarioId::ALL {
        let mut engine = SimulationEngine::new(SimConfig::default());
        scenario::build_scenario(&mut engine, id).unwrap();
        let snap = (0..60).map(|_| engine.tick()).last().unwrap();
        assert_eq!(snap.count_role(EntityRole::Player), 1, "{id}");
        assert!(snap.count_role(EntityRole::Enemy) >= 1, "{id}");
    }
}

#[test]
fn test_scenario_names_parse() {
    for id in ScenarioId::ALL {
        assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
    }
    assert!(matches!(
        "nope".parse::<ScenarioId>(),
        Err(SimError::UnknownScenario(_))
    ));
}

// ---- Tick timing ----

#[test]
fn test_tick_advances_time() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    for _ in 0..60 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 60);
    assert!((engine.time().elapsed_secs - 1.0).abs() < 1e-4);
}

#[test]
fn test_time_scale_stretches_ticks() {
    let mut engine = SimulationEngine::new(SimConfig {
        time_scale: 2.0,
        ..Default::default()
    });
    engine.tick();
    assert!((engine.time().elapsed_secs - 2.0 * DT as f64).abs() < 1e-6);
}

// ---- Pause/Resume ----

#[test]
fn test_pause_stops_simulation() {
    let (mut engine, _) = engine_with_area(1000.0);
    let shot = engine
        .spawn_bullet(bullet(EntityRole::PlayerBullet, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0, 1.0))
        .unwrap();

    engine.tick();
    assert!(close(hitbox(&engine, shot).origin(), Vec2::new(1.0, 0.0)));

    engine.queue_command(PlayerCommand::Pause);
    for _ in 0..10 {
        let snap = engine.tick();
        assert_eq!(snap.phase, GamePhase::Paused);
    }
    assert_eq!(engine.time().tick, 1);
    assert!(close(hitbox(&engine, shot).origin(), Vec2::new(1.0, 0.0)));

    engine.queue_command(PlayerCommand::Resume);
    engine.tick();
    assert_eq!(engine.time().tick, 2);
    assert!(close(hitbox(&engine, shot).origin(), Vec2::new(2.0, 0.0)));
}

// ---- Player commands ----

#[test]
fn test_set_velocity_is_clamped_to_max_speed() {
    let (mut engine, _) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    engine.queue_command(PlayerCommand::SetVelocity { x: 30.0, y: 40.0 });
    engine.tick();

    // Default max speed is 6: (30, 40) becomes (3.6, 4.8).
    assert!(close(hitbox(&engine, player).origin(), Vec2::new(3.6, 4.8)));
}

#[test]
fn test_set_facing_rotates_circles() {
    let (mut engine, _) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    engine.queue_command(PlayerCommand::SetFacing { angle: 1.0 });
    engine.tick();
    assert_eq!(hitbox(&engine, player).last_faced_angle(), 1.0);
}

#[test]
fn test_player_shooting_spawns_bullets() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine.spawn_player(Vec2::ZERO).unwrap();
    engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::new(300.0, 0.0))
                .with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 100.0)),
        )
        .unwrap();

    let snap = engine.tick();
    assert_eq!(snap.count_role(EntityRole::PlayerBullet), 0);

    engine.queue_command(PlayerCommand::SetShooting { shooting: true });
    let snap = engine.tick();
    assert_eq!(snap.count_role(EntityRole::PlayerBullet), 1);
}

#[test]
fn test_aimed_parts_hold_fire_without_player() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine
        .spawn_enemy(area, scenario::drone(Vec2::new(0.0, 100.0)).unwrap())
        .unwrap();
    for _ in 0..200 {
        let snap = engine.tick();
        assert_eq!(snap.count_role(EntityRole::EnemyBullet), 0);
    }
}

// ---- Movement ----

#[test]
fn test_body_contact_blocks_both_sides() {
    let (mut engine, area) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    let enemy = engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::new(50.0, 0.0))
                .with_circle(CircleSpec::new(Vec2::ZERO, 20.0, 10.0)),
        )
        .unwrap();
    engine.queue_command(PlayerCommand::SetVelocity { x: 6.0, y: 0.0 });

    engine.tick();
    assert!(close(hitbox(&engine, player).origin(), Vec2::new(6.0, 0.0)));

    // The next step would overlap; neither body moves.
    for _ in 0..5 {
        engine.tick();
        assert!(close(hitbox(&engine, player).origin(), Vec2::new(6.0, 0.0)));
        assert!(close(hitbox(&engine, enemy).origin(), Vec2::new(50.0, 0.0)));
    }
}

#[test]
fn test_intangible_bodies_pass_through() {
    let (mut engine, area) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::new(50.0, 0.0))
                .with_circle(CircleSpec::new(Vec2::ZERO, 20.0, 10.0)),
        )
        .unwrap();
    engine
        .world_mut()
        .get::<&mut HitboxComponent>(player)
        .unwrap()
        .set_intangible(true);
    engine.queue_command(PlayerCommand::SetVelocity { x: 6.0, y: 0.0 });

    for _ in 0..5 {
        engine.tick();
    }
    assert!(close(hitbox(&engine, player).origin(), Vec2::new(30.0, 0.0)));
}

#[test]
fn test_boundary_holds_player_and_requests_transition() {
    let (mut engine, _) = engine_with_area(100.0);
    let player = engine.spawn_player(Vec2::new(97.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::SetVelocity { x: 6.0, y: 0.0 });

    let snap = engine.tick();
    assert!(close(hitbox(&engine, player).origin(), Vec2::new(97.0, 0.0)));
    let angle = snap.events.iter().find_map(|e| match e {
        SimEvent::MapAreaTransitionRequested { entity, role, angle } => {
            assert_eq!(*entity, entity_id(player));
            assert_eq!(*role, EntityRole::Player);
            Some(*angle)
        }
        _ => None,
    });
    assert!(angle.unwrap().abs() < 1e-4);
}

#[test]
fn test_bullet_leaving_area_is_removed() {
    let (mut engine, _) = engine_with_area(100.0);
    engine
        .spawn_bullet(bullet(EntityRole::EnemyBullet, Vec2::ZERO, Vec2::new(0.0, 50.0), 3.0, 1.0))
        .unwrap();

    assert_eq!(engine.tick().count_role(EntityRole::EnemyBullet), 1);
    assert_eq!(engine.tick().count_role(EntityRole::EnemyBullet), 1);
    assert_eq!(engine.tick().count_role(EntityRole::EnemyBullet), 0);
}

#[test]
fn test_enemies_outside_focused_area_are_frozen() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let home = engine.add_map_area(Vec2::ZERO, None);
    let away = engine.add_map_area(Vec2::new(5000.0, 0.0), None);
    engine.focus_map_area(home).unwrap();
    engine.spawn_player(Vec2::ZERO).unwrap();
    let sleeper = engine
        .spawn_enemy(
            away,
            EnemyData::new(Vec2::new(5000.0, 0.0), 3.0, AiStrategy::follow())
                .with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 1.0)),
        )
        .unwrap();

    for _ in 0..30 {
        engine.tick();
    }
    assert!(close(hitbox(&engine, sleeper).origin(), Vec2::new(5000.0, 0.0)));
    assert_eq!(engine.map_area(away).unwrap().enemies.len(), 1);
}

#[test]
fn test_commit_moves_by_velocity_then_accelerates() {
    let (mut engine, area) = engine_with_area(1000.0);
    let enemy = engine
        .spawn_enemy(
            area,
            EnemyData::new(Vec2::ZERO, 10.0, AiStrategy::follow())
                .with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 5.0)),
        )
        .unwrap();
    // Without a strategy nothing overwrites the motion set here.
    engine.world_mut().remove_one::<AiStrategy>(enemy).unwrap();
    {
        let mut hitbox = engine.world_mut().get::<&mut HitboxComponent>(enemy).unwrap();
        hitbox.set_velocity(Vec2::new(2.0, 0.0));
        hitbox.set_acceleration(Vec2::new(0.5, 1.0));
    }

    engine.tick();
    let after_one = hitbox(&engine, enemy);
    assert!(close(after_one.origin(), Vec2::new(2.0, 0.0)));
    assert!(close(after_one.velocity(), Vec2::new(2.5, 1.0)));

    engine.tick();
    let after_two = hitbox(&engine, enemy);
    assert!(close(after_two.origin(), Vec2::new(4.5, 1.0)));
    assert!(close(after_two.velocity(), Vec2::new(3.0, 2.0)));
}

#[test]
fn test_empty_enemy_template_is_rejected() {
    let (mut engine, area) = engine_with_area(1000.0);
    let err = engine
        .spawn_enemy(area, stationary_enemy(Vec2::ZERO))
        .unwrap_err();
    assert!(matches!(err, SimError::Hitbox(HitboxError::NoCircles)));
    assert!(engine.map_area(area).unwrap().enemies.is_empty());
    assert_eq!(engine.snapshot().count_role(EntityRole::Enemy), 0);
}

// ---- Bullets and damage ----

#[test]
fn test_bullet_kills_small_circle_without_split() {
    let (mut engine, area) = engine_with_area(1000.0);
    let enemy = engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::ZERO)
                .with_circle(CircleSpec::new(Vec2::ZERO, 30.0, 10.0))
                .with_circle(CircleSpec::new(Vec2::new(50.0, 0.0), 20.0, 10.0)),
        )
        .unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(78.0, 0.0),
            Vec2::new(-5.0, 0.0),
            5.0,
            10.0,
        ))
        .unwrap();

    let snap = engine.tick();
    assert!(snap
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::BulletHit { circle, .. } if *circle == CircleId(1))));
    assert!(snap
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::CircleDestroyed { circle, .. } if *circle == CircleId(1))));
    assert!(!snap
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::EntitySplit { .. })));

    assert_eq!(snap.count_role(EntityRole::Enemy), 1);
    assert_eq!(snap.count_role(EntityRole::PlayerBullet), 0);
    let view = snap.entity(entity_id(enemy)).unwrap();
    assert_eq!(view.circles.len(), 1);
    assert_eq!(view.circles[0].radius, 30.0);
    assert_eq!(view.circles[0].health, 10.0);
    assert!(close(view.circles[0].center, Vec2::ZERO));
}

#[test]
fn test_bullet_hits_only_opposing_side() {
    let (mut engine, _) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    // A player bullet sitting on the player does nothing.
    engine
        .spawn_bullet(bullet(EntityRole::PlayerBullet, Vec2::ZERO, Vec2::ZERO, 5.0, 50.0))
        .unwrap();

    let snap = engine.tick();
    assert_eq!(snap.count_role(EntityRole::PlayerBullet), 1);
    assert_eq!(hitbox(&engine, player).total_health(), 100.0);
}

#[test]
fn test_lifesteal_heals_shooter() {
    let (mut engine, area) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    let shooter = engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::new(300.0, 0.0))
                .with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 10.0)),
        )
        .unwrap();
    engine
        .world_mut()
        .get::<&mut HitboxComponent>(shooter)
        .unwrap()
        .circle_mut(CircleId(0))
        .unwrap()
        .damage(5.0);

    let mut spawn = bullet(
        EntityRole::EnemyBullet,
        Vec2::new(0.0, 30.0),
        Vec2::new(0.0, -6.0),
        5.0,
        4.0,
    );
    spawn.source = Some(entity_id(shooter));
    spawn.lifesteal_percent = 0.5;
    engine.spawn_bullet(spawn).unwrap();

    engine.tick();
    assert!((hitbox(&engine, player).total_health() - 96.0).abs() < 1e-4);
    assert!((hitbox(&engine, shooter).total_health() - 7.0).abs() < 1e-4);
}

#[test]
fn test_player_death_clears_player() {
    let (mut engine, _) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::EnemyBullet,
            Vec2::new(0.0, 30.0),
            Vec2::new(0.0, -6.0),
            5.0,
            500.0,
        ))
        .unwrap();

    let snap = engine.tick();
    assert!(engine.player().is_none());
    assert!(!engine.world().contains(player));
    assert!(snap.events.iter().any(|e| matches!(
        e,
        SimEvent::EntityDestroyed {
            role: EntityRole::Player,
            ..
        }
    )));
}

#[test]
fn test_lifetime_expiry() {
    let (mut engine, _) = engine_with_area(1000.0);
    let mut spawn = bullet(EntityRole::EnemyBullet, Vec2::ZERO, Vec2::ZERO, 3.0, 1.0);
    spawn.lifetime_secs = Some(20.0);
    let shot = engine.spawn_bullet(spawn).unwrap();

    for _ in 0..1190 {
        engine.tick();
    }
    assert!(engine.world().contains(shot));

    let mut expired = false;
    for _ in 0..20 {
        let snap = engine.tick();
        expired |= snap
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::BulletExpired { bullet } if *bullet == entity_id(shot)));
    }
    assert!(expired);
    assert!(!engine.world().contains(shot));
}

#[test]
fn test_homing_bullet_turns_toward_player() {
    let (mut engine, _) = engine_with_area(1000.0);
    engine.spawn_player(Vec2::new(0.0, 200.0)).unwrap();
    let mut spawn = bullet(EntityRole::EnemyBullet, Vec2::ZERO, Vec2::new(4.0, 0.0), 3.0, 1.0);
    spawn.attraction_lerp_factor = 0.1;
    let shot = engine.spawn_bullet(spawn).unwrap();

    engine.tick();
    let velocity = hitbox(&engine, shot).velocity();
    assert!(velocity.y > 0.0);
    assert!((velocity.length() - 4.0).abs() < 1e-4);
}

// ---- Fragmentation ----

#[test]
fn test_killing_bridge_splits_enemy() {
    let (mut engine, area) = engine_with_area(1000.0);
    let enemy = engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::ZERO)
                .with_circle(CircleSpec::new(Vec2::ZERO, 20.0, 5.0))
                .with_circle(CircleSpec::new(Vec2::new(-30.0, 0.0), 10.0, 5.0))
                .with_circle(CircleSpec::new(Vec2::new(30.0, 0.0), 10.0, 5.0)),
        )
        .unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(0.0, 28.0),
            Vec2::new(0.0, -5.0),
            5.0,
            10.0,
        ))
        .unwrap();

    let snap = engine.tick();
    let children = snap
        .events
        .iter()
        .find_map(|e| match e {
            SimEvent::EntitySplit { parent, children } => {
                assert_eq!(*parent, entity_id(enemy));
                Some(children.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(snap.count_role(EntityRole::Enemy), 2);
    assert_eq!(snap.map_area.as_ref().unwrap().enemy_count, 2);

    // Ties keep the first remaining circle on the parent.
    let parent = snap.entity(entity_id(enemy)).unwrap();
    assert!(close(parent.origin, Vec2::new(-30.0, 0.0)));
    let child = snap.entity(children[0]).unwrap();
    assert!(close(child.origin, Vec2::new(30.0, 0.0)));
    assert!(close(child.circles[0].center, Vec2::new(30.0, 0.0)));
}

/// Killing one of N mutually disjoint circles leaves N-1 single-circle enemies.
#[test]
fn test_killing_one_disjoint_circle_leaves_n_minus_one() {
    let (mut engine, area) = engine_with_area(1000.0);
    let mut data = stationary_enemy(Vec2::ZERO);
    for i in -2..=2 {
        data = data.with_circle(CircleSpec::new(Vec2::new(i as f32 * 40.0, 0.0), 10.0, 5.0));
    }
    engine.spawn_enemy(area, data).unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(0.0, 28.0),
            Vec2::new(0.0, -5.0),
            5.0,
            10.0,
        ))
        .unwrap();

    let snap = engine.tick();
    let enemies: Vec<_> = snap
        .entities
        .iter()
        .filter(|e| e.role == EntityRole::Enemy)
        .collect();
    assert_eq!(enemies.len(), 4);
    assert!(enemies.iter().all(|e| e.circles.len() == 1));
    assert_eq!(snap.map_area.as_ref().unwrap().enemy_count, 4);
}

#[test]
fn test_split_pieces_use_sub_entity_stats() {
    let (mut engine, area) = engine_with_area(1000.0);
    let mut data = stationary_enemy(Vec2::ZERO)
        .with_circle(CircleSpec::new(Vec2::ZERO, 20.0, 5.0))
        .with_circle(CircleSpec::new(Vec2::new(-30.0, 0.0), 10.0, 5.0))
        .with_circle(CircleSpec::new(Vec2::new(30.0, 0.0), 10.0, 5.0));
    data.sub_entity_stats = Some(crate::world_setup::SubEntityStats {
        max_speed: 7.0,
        ai: Some(AiStrategy::stalk(1.0, 10.0, 100.0)),
    });
    engine.spawn_enemy(area, data).unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(0.0, 28.0),
            Vec2::new(0.0, -5.0),
            5.0,
            10.0,
        ))
        .unwrap();
    engine.tick();

    let mut query = engine.world().query::<(&HitboxComponent, &AiStrategy)>();
    let stats: Vec<(f32, &'static str)> = query
        .iter()
        .map(|(_, (hitbox, ai))| (hitbox.max_speed(), ai.name()))
        .collect();
    assert!(stats.contains(&(7.0, "stalk")));
    assert!(stats.contains(&(0.0, "follow")));
}

// ---- Custom collision ----

#[test]
fn test_contact_knockback_pushes_player() {
    let (mut engine, area) = engine_with_area(1000.0);
    let player = engine.spawn_player(Vec2::ZERO).unwrap();
    let mut data = stationary_enemy(Vec2::new(44.0, 0.0))
        .with_circle(CircleSpec::new(Vec2::ZERO, 20.0, 10.0));
    data.collision = Some(CustomCollision::new(ContactKnockback { strength: 3.0 }));
    engine.spawn_enemy(area, data).unwrap();
    engine.queue_command(PlayerCommand::SetVelocity { x: 6.0, y: 0.0 });

    engine.tick();
    let hitbox = hitbox(&engine, player);
    assert!(close(hitbox.origin(), Vec2::ZERO));
    assert!(close(hitbox.velocity(), Vec2::new(3.0, 0.0)));
}

// ---- Modifiers ----

#[derive(Debug, Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

impl MapAreaModifier for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_enemy_data_creation(&mut self, _data: &mut EnemyData, _ctx: &mut ModifierContext) {
        self.push("create".into());
    }

    fn on_entity_enter(&mut self, entity: Entity, ctx: &mut ModifierContext) {
        let role = ctx.world.get::<&EntityRole>(entity).map(|r| *r).unwrap();
        self.push(format!("enter:{role:?}"));
    }

    fn on_enemy_circle_death(&mut self, enemy: Entity, circle: CircleId, ctx: &mut ModifierContext) {
        let present = ctx
            .world
            .get::<&HitboxComponent>(enemy)
            .map(|h| h.circle(circle).is_some())
            .unwrap_or(false);
        self.push(format!("circle_death:{present}"));
    }

    fn on_enemy_death(&mut self, enemy: Entity, ctx: &mut ModifierContext) {
        self.push(format!("death:{}", ctx.world.contains(enemy)));
    }

    fn on_player_leave(&mut self, _player: Entity, _ctx: &mut ModifierContext) {
        self.push("leave".into());
    }
}

#[test]
fn test_modifier_hook_order() {
    let (mut engine, area) = engine_with_area(1000.0);
    let recorder = Recorder::default();
    engine.add_modifier(area, Box::new(recorder.clone())).unwrap();
    assert_eq!(engine.map_area(area).unwrap().modifier_names(), vec!["recorder"]);

    engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::ZERO).with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 1.0)),
        )
        .unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(0.0, 18.0),
            Vec2::new(0.0, -5.0),
            5.0,
            1.0,
        ))
        .unwrap();
    engine.tick();

    let log = recorder.log.lock().unwrap().clone();
    assert_eq!(
        log,
        vec!["create", "enter:Enemy", "circle_death:true", "death:true"]
    );
    assert_eq!(engine.map_area(area).unwrap().enemies.len(), 0);
}

#[test]
fn test_unknown_area_is_an_error() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    assert!(matches!(
        engine.focus_map_area(MapAreaId(9)),
        Err(SimError::UnknownMapArea(MapAreaId(9)))
    ));
    assert!(matches!(
        engine.add_modifier(MapAreaId(9), Box::new(Recorder::default())),
        Err(SimError::UnknownMapArea(_))
    ));
    assert!(matches!(
        engine.enter_map_area(MapAreaId(0)),
        Err(SimError::NoPlayer)
    ));
}

#[test]
fn test_stat_scaling_applies_at_creation() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine
        .add_modifier(area, Box::new(StatScaling::uniform(2.0)))
        .unwrap();
    let enemy = engine
        .spawn_enemy(area, scenario::drone(Vec2::new(0.0, 100.0)).unwrap())
        .unwrap();

    let hitbox = hitbox(&engine, enemy);
    let circle = &hitbox.circles()[0];
    assert_eq!(circle.max_health(), 6.0);
    let part = &circle.attack().unwrap().pattern().parts()[0];
    assert_eq!(part.speed, 8.0);
    assert_eq!(part.damage, 2.0);
    assert_eq!(part.radius, 5.0);
}

#[test]
fn test_death_burst_rings_bullets() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine
        .add_modifier(
            area,
            Box::new(DeathBurst {
                count: 4,
                ..Default::default()
            }),
        )
        .unwrap();
    engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::ZERO).with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 1.0)),
        )
        .unwrap();
    engine
        .spawn_bullet(bullet(
            EntityRole::PlayerBullet,
            Vec2::new(0.0, 18.0),
            Vec2::new(0.0, -5.0),
            5.0,
            1.0,
        ))
        .unwrap();

    let snap = engine.tick();
    assert_eq!(snap.count_role(EntityRole::Enemy), 0);
    assert_eq!(snap.count_role(EntityRole::EnemyBullet), 4);
}

#[test]
fn test_regeneration_heals_enemies() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine
        .add_modifier(area, Box::new(Regeneration { health_per_sec: 60.0 }))
        .unwrap();
    let enemy = engine
        .spawn_enemy(
            area,
            stationary_enemy(Vec2::ZERO).with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 10.0)),
        )
        .unwrap();
    engine
        .world_mut()
        .get::<&mut HitboxComponent>(enemy)
        .unwrap()
        .circle_mut(CircleId(0))
        .unwrap()
        .damage(5.0);

    engine.tick();
    assert!((hitbox(&engine, enemy).total_health() - 6.0).abs() < 1e-3);
    for _ in 0..10 {
        engine.tick();
    }
    assert!((hitbox(&engine, enemy).total_health() - 10.0).abs() < 1e-4);
}

#[test]
fn test_entry_grace_makes_player_briefly_intangible() {
    let (mut engine, area) = engine_with_area(1000.0);
    engine
        .add_modifier(area, Box::new(EntryGrace::new(0.5)))
        .unwrap();
    let player = engine.spawn_player(Vec2::ZERO).unwrap();

    engine.tick();
    assert!(hitbox(&engine, player).is_intangible());
    for _ in 0..40 {
        engine.tick();
    }
    assert!(!hitbox(&engine, player).is_intangible());
}

// ---- Travel ----

#[test]
fn test_enter_map_area_travels_to_center() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let home = engine.add_map_area(Vec2::ZERO, None);
    let next = engine.add_map_area(Vec2::new(3000.0, 0.0), None);
    let recorder = Recorder::default();
    engine.add_modifier(home, Box::new(recorder.clone())).unwrap();
    engine.focus_map_area(home).unwrap();
    let player = engine.spawn_player(Vec2::ZERO).unwrap();

    engine.enter_map_area(next).unwrap();
    assert_eq!(engine.focused_area_id(), Some(next));
    assert!(recorder.log.lock().unwrap().contains(&"leave".to_string()));

    let first = engine.tick();
    assert!(first
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::MapAreaEntered { area } if *area == next)));
    assert!(hitbox(&engine, player).is_intangible());

    // Player input is ignored in transit.
    engine.queue_command(PlayerCommand::SetVelocity { x: 0.0, y: 6.0 });

    let mut arrived = false;
    for _ in 0..300 {
        let snap = engine.tick();
        if snap
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::TravelCompleted { entity } if *entity == entity_id(player)))
        {
            arrived = true;
            break;
        }
    }
    assert!(arrived);
    let hitbox = hitbox(&engine, player);
    assert!(close(hitbox.origin(), Vec2::new(3000.0, 0.0)));
    assert!(!hitbox.is_intangible());
    assert_eq!(hitbox.velocity(), Vec2::ZERO);
    assert!(hitbox.travel().is_none());
}

// ---- Config ----

#[test]
fn test_config_json_defaults() {
    let config = SimConfig::from_json_str(r#"{ "seed": 9, "player": { "radius": 30.0 } }"#).unwrap();
    assert_eq!(config.seed, 9);
    assert_eq!(config.time_scale, 1.0);
    assert_eq!(config.player.radius, 30.0);
    assert_eq!(config.player.health, 100.0);
    assert!(config.player.attack.is_some());

    assert!(matches!(
        SimConfig::from_json_str("{ seed: }"),
        Err(SimError::Json(_))
    ));
}

#[test]
fn test_config_rejects_invalid_player_pattern() {
    let out_of_order = r#"{ "player": { "attack": {
        "duration": 2.0, "parts": [{ "delay": 1.0 }, { "delay": 0.2 }] } } }"#;
    let err = SimConfig::from_json_str(out_of_order).unwrap_err();
    assert!(matches!(err, SimError::Json(_)));
    assert!(err.to_string().contains("earlier than"), "{err}");

    let zero_duration = r#"{ "player": { "attack": { "duration": 0.0, "parts": [{}] } } }"#;
    assert!(matches!(
        SimConfig::from_json_str(zero_duration),
        Err(SimError::Json(_))
    ));

    let ok = r#"{ "player": { "attack": {
        "duration": 2.0, "parts": [{ "delay": 0.2 }, { "delay": 1.0, "damage": 4.0 }] } } }"#;
    let pattern = SimConfig::from_json_str(ok).unwrap().player.attack.unwrap();
    assert!((pattern.total_damage() - 5.0).abs() < 1e-6);
}

#[test]
fn test_config_rejects_non_positive_time_scale() {
    for json in [
        r#"{ "time_scale": 0.0 }"#,
        r#"{ "time_scale": -1.0 }"#,
        r#"{ "travel_speed": 0.0 }"#,
    ] {
        assert!(
            matches!(SimConfig::from_json_str(json), Err(SimError::InvalidConfig(_))),
            "{json}"
        );
    }
    assert!(SimConfig::from_json_str(r#"{ "time_scale": 0.5 }"#).is_ok());
}

// ---- Persistence ----

#[test]
fn test_save_load_round_trip() {
    let dir = std::env::temp_dir().join("circlewar_test_engine_round_trip");
    let _ = std::fs::remove_dir_all(&dir);

    let config = SimConfig {
        seed: 77,
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(config.clone());
    scenario::build_scenario(&mut engine, ScenarioId::Drone).unwrap();
    for _ in 0..30 {
        engine.tick();
    }
    engine.save_to_file(&dir, "quick").unwrap();
    let before = engine.snapshot();

    let mut restored = SimulationEngine::new(config);
    restored.load_from_file(&dir, "quick").unwrap();
    let after = restored.snapshot();

    assert_eq!(after.time.tick, 30);
    assert!(restored.player().is_some());
    assert_eq!(after.entities.len(), before.entities.len());
    assert_eq!(
        after.map_area.as_ref().unwrap().enemy_count,
        before.map_area.as_ref().unwrap().enemy_count
    );
    for (a, b) in before.entities.iter().zip(&after.entities) {
        assert_eq!(a.role, b.role);
        assert!(close(a.origin, b.origin));
        assert_eq!(a.circles.len(), b.circles.len());
        for (ca, cb) in a.circles.iter().zip(&b.circles) {
            assert!(close(ca.center, cb.center));
            assert_eq!(ca.health, cb.health);
        }
    }

    // The restored world keeps running.
    for _ in 0..30 {
        restored.tick();
    }
    assert_eq!(restored.time().tick, 60);
    let _ = std::fs::remove_dir_all(&dir);
}

/// Rewrite the first multi-part attack pattern found in a save file.
fn edit_saved_pattern(path: &std::path::Path, edit: impl Fn(&mut serde_json::Value)) {
    let json = std::fs::read_to_string(path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let pattern = value["entities"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .flat_map(|e| e["hitbox"]["circles"].as_array_mut().unwrap().iter_mut())
        .map(|c| &mut c["attack"])
        .find(|a| a["parts"].as_array().map_or(false, |parts| parts.len() >= 2))
        .unwrap();
    edit(pattern);
    std::fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
}

#[test]
fn test_load_rejects_invalid_saved_pattern() {
    let dir = std::env::temp_dir().join("circlewar_test_invalid_pattern");
    let _ = std::fs::remove_dir_all(&dir);

    let mut engine = SimulationEngine::new(SimConfig::default());
    scenario::build_scenario(&mut engine, ScenarioId::Boss).unwrap();
    engine.save_to_file(&dir, "good").unwrap();
    engine.save_to_file(&dir, "out_of_order").unwrap();
    engine.save_to_file(&dir, "zero_duration").unwrap();

    edit_saved_pattern(&dir.join("out_of_order.json"), |pattern| {
        pattern["parts"][0]["delay"] = serde_json::json!(2.0);
    });
    edit_saved_pattern(&dir.join("zero_duration.json"), |pattern| {
        pattern["duration"] = serde_json::json!(0.0);
    });

    let mut restored = SimulationEngine::new(SimConfig::default());
    restored.load_from_file(&dir, "good").unwrap();
    for slot in ["out_of_order", "zero_duration"] {
        let mut restored = SimulationEngine::new(SimConfig::default());
        assert!(
            matches!(restored.load_from_file(&dir, slot), Err(SimError::Json(_))),
            "{slot}"
        );
    }
    let _ = std::fs::remove_dir_all(&dir);
}
