//! Scenario definitions: hardcoded enemy templates and area layouts.
//!
//! Used by the headless runner and the integration tests.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use circlewar_ai::AiStrategy;
use circlewar_core::attack::{AngleSpec, AttackPart, AttackPattern};
use circlewar_core::enums::AngleType;
use circlewar_core::error::PatternError;
use circlewar_core::types::from_polar;

use crate::collision::{ContactDamage, CustomCollision};
use crate::engine::SimulationEngine;
use crate::error::SimError;
use crate::modifiers::{DeathBurst, EntryGrace, Regeneration, StatScaling};
use crate::world_setup::{CircleSpec, EnemyData, SubEntityStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioId {
    /// Three single-circle drones.
    Drone,
    /// Two three-circle twins that break apart.
    Twin,
    /// One stationary-ish turret firing rings.
    RingTurret,
    /// A boss with satellites in a modified area.
    Boss,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 4] = [
        ScenarioId::Drone,
        ScenarioId::Twin,
        ScenarioId::RingTurret,
        ScenarioId::Boss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScenarioId::Drone => "drone",
            ScenarioId::Twin => "twin",
            ScenarioId::RingTurret => "ring_turret",
            ScenarioId::Boss => "boss",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| SimError::UnknownScenario(s.to_string()))
    }
}

/// Populate `engine` with a focused area, the player, and the scenario's enemies.
pub fn build_scenario(engine: &mut SimulationEngine, scenario: ScenarioId) -> Result<(), SimError> {
    let area = engine.add_map_area(Vec2::ZERO, None);
    engine.focus_map_area(area)?;

    if scenario == ScenarioId::Boss {
        engine.add_modifier(area, Box::new(EntryGrace::default()))?;
        engine.add_modifier(area, Box::new(StatScaling::uniform(1.5)))?;
        engine.add_modifier(
            area,
            Box::new(DeathBurst {
                on_circle_death: true,
                ..Default::default()
            }),
        )?;
        engine.add_modifier(area, Box::new(Regeneration { health_per_sec: 0.5 }))?;
    }

    engine.spawn_player(Vec2::new(0.0, -300.0))?;

    let enemies = match scenario {
        ScenarioId::Drone => vec![
            drone(Vec2::new(-200.0, 200.0))?,
            drone(Vec2::new(0.0, 250.0))?,
            drone(Vec2::new(200.0, 200.0))?,
        ],
        ScenarioId::Twin => vec![twin(Vec2::new(-150.0, 150.0))?, twin(Vec2::new(150.0, 150.0))?],
        ScenarioId::RingTurret => vec![ring_turret(Vec2::new(0.0, 200.0))?],
        ScenarioId::Boss => vec![boss(Vec2::new(0.0, 250.0))?],
    };
    let count = enemies.len();
    for data in enemies {
        engine.spawn_enemy(area, data)?;
    }
    log::info!("built scenario {scenario} with {count} enemies");
    Ok(())
}

/// Single circle, follows the player, one aimed shot every 1.5s.
pub fn drone(position: Vec2) -> Result<EnemyData, PatternError> {
    let pattern = AttackPattern::from_parts(
        1.5,
        [AttackPart {
            speed: 4.0,
            radius: 5.0,
            angle_type: AngleType::AimAtPlayer,
            ..Default::default()
        }],
    )?;
    Ok(EnemyData::new(position, 3.0, AiStrategy::follow())
        .with_circle(CircleSpec::new(Vec2::ZERO, 15.0, 3.0).with_attack(pattern)))
}

/// Two armed pods joined by a small core. Killing the core splits the pods
/// into fast followers.
pub fn twin(position: Vec2) -> Result<EnemyData, PatternError> {
    let pod_pattern = || {
        AttackPattern::from_parts(
            1.0,
            [AttackPart {
                speed: 5.0,
                radius: 4.0,
                angle_type: AngleType::AimAtPlayer,
                angle: AngleSpec::Range {
                    min: -0.2,
                    max: 0.2,
                },
                ..Default::default()
            }],
        )
    };
    let mut data = EnemyData::new(position, 2.0, AiStrategy::stalk(1.0, 150.0, 400.0))
        .with_circle(CircleSpec::new(Vec2::ZERO, 10.0, 4.0).with_color("core"))
        .with_circle(CircleSpec::new(Vec2::new(-25.0, 0.0), 16.0, 6.0).with_attack(pod_pattern()?))
        .with_circle(CircleSpec::new(Vec2::new(25.0, 0.0), 16.0, 6.0).with_attack(pod_pattern()?));
    data.sub_entity_stats = Some(SubEntityStats {
        max_speed: 4.0,
        ai: Some(AiStrategy::follow()),
    });
    Ok(data)
}

/// Wanders around its spawn point, firing an eight-bullet ring every 2s.
pub fn ring_turret(position: Vec2) -> Result<EnemyData, PatternError> {
    let ring = (0..8).map(|i| AttackPart {
        speed: 3.0,
        radius: 6.0,
        angle: AngleSpec::Fixed(TAU * i as f32 / 8.0),
        ..Default::default()
    });
    let pattern = AttackPattern::from_parts(2.0, ring)?;
    Ok(EnemyData::new(position, 1.5, AiStrategy::wander(position, 120.0))
        .with_circle(CircleSpec::new(Vec2::ZERO, 30.0, 20.0).with_attack(pattern)))
}

/// Heavy core with homing, lifestealing shots and four satellites that
/// sweep rotating volleys. Hurts on contact.
pub fn boss(position: Vec2) -> Result<EnemyData, PatternError> {
    let core_pattern = AttackPattern::from_parts(
        2.5,
        [
            AttackPart {
                speed: 4.0,
                radius: 8.0,
                damage: 3.0,
                lifesteal_percent: 0.5,
                player_attraction_lerp_factor: 0.05,
                angle_type: AngleType::AimAtPlayer,
                ..Default::default()
            },
            AttackPart {
                delay: 1.0,
                speed: 4.0,
                radius: 8.0,
                damage: 3.0,
                lifesteal_percent: 0.5,
                player_attraction_lerp_factor: 0.05,
                angle_type: AngleType::AimAtPlayer,
                ..Default::default()
            },
        ],
    )?;

    let mut data = EnemyData::new(position, 1.0, AiStrategy::stalk(0.5, 200.0, 500.0));
    data.boss = true;
    data.collision = Some(CustomCollision::new(ContactDamage { damage: 5.0 }));
    data.circles
        .push(CircleSpec::new(Vec2::ZERO, 40.0, 60.0).with_attack(core_pattern).with_color("boss"));

    for i in 0..4 {
        let direction = TAU * i as f32 / 4.0;
        let sweep = (0..3).map(|step| AttackPart {
            delay: 0.3 * step as f32,
            speed: 5.0,
            radius: 5.0,
            angle_type: AngleType::RelativeToParentRotation,
            angle: AngleSpec::Fixed(direction + 0.2 * step as f32),
            ..Default::default()
        });
        let pattern = AttackPattern::from_parts(1.8, sweep)?;
        data.circles
            .push(CircleSpec::new(from_polar(direction, 55.0), 18.0, 12.0).with_attack(pattern));
    }
    data.sub_entity_stats = Some(SubEntityStats {
        max_speed: 3.0,
        ai: Some(AiStrategy::follow()),
    });
    Ok(data)
}
