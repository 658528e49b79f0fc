//! Player commands sent from the input layer to the simulation.
//!
//! Commands are queued and applied at the next tick boundary.

use serde::{Deserialize, Serialize};

/// All possible player intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    /// Set the player's velocity (units per frame). Clamped to max speed.
    SetVelocity { x: f32, y: f32 },
    /// Start or stop the player's attack patterns.
    SetShooting { shooting: bool },
    /// Turn the player to face `angle` (radians).
    SetFacing { angle: f32 },
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,
}
