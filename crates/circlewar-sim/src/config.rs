//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! wants to change.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use circlewar_core::attack::{AngleSpec, AttackPart, AttackPattern};
use circlewar_core::constants::*;
use circlewar_core::enums::AngleType;

use crate::error::SimError;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Multiplier on the nominal tick length (1.0 = normal).
    pub time_scale: f32,
    /// Radius used by map areas created without an explicit one.
    pub map_area_radius: f32,
    /// Units per frame for map area transit.
    pub travel_speed: f32,
    pub player: PlayerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_scale: 1.0,
            map_area_radius: DEFAULT_MAP_AREA_RADIUS,
            travel_speed: DEFAULT_TRAVEL_SPEED,
            player: PlayerConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive time scale, area radius, or travel speed.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("time_scale", self.time_scale),
            ("map_area_radius", self.map_area_radius),
            ("travel_speed", self.travel_speed),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimError::InvalidConfig(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded sim config from {}", path.display());
        Ok(config)
    }
}

/// Player spawn parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_speed: f32,
    pub radius: f32,
    pub health: f32,
    pub attack: Option<AttackPattern>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_PLAYER_MAX_SPEED,
            radius: DEFAULT_PLAYER_RADIUS,
            health: DEFAULT_PLAYER_HEALTH,
            attack: default_player_pattern(),
        }
    }
}

/// A single forward stream of bullets, five shots per second.
fn default_player_pattern() -> Option<AttackPattern> {
    AttackPattern::from_parts(
        0.2,
        [AttackPart {
            speed: 12.0,
            radius: 5.0,
            damage: 1.0,
            angle_type: AngleType::RelativeToParentRotation,
            angle: AngleSpec::Fixed(0.0),
            ..Default::default()
        }],
    )
    .ok()
}
