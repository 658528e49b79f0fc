//! Simulation-level errors.

use thiserror::Error;

use circlewar_core::error::{HitboxError, PatternError};
use circlewar_core::types::MapAreaId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown map area {0:?}")]
    UnknownMapArea(MapAreaId),
    #[error("no player entity has been spawned")]
    NoPlayer,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unknown scenario {0:?}")]
    UnknownScenario(String),
    #[error(transparent)]
    Hitbox(#[from] HitboxError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("save file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
