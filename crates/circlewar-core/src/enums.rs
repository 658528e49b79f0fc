//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Which of the four collision classes an entity belongs to.
///
/// Only cross-class pairs are ever tested for collision; entities of the
/// same role pass through each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRole {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
}

impl EntityRole {
    pub fn is_bullet(self) -> bool {
        matches!(self, EntityRole::PlayerBullet | EntityRole::EnemyBullet)
    }

    /// Whether a body of role `self` can be struck by a bullet of role `bullet`.
    pub fn is_hit_by(self, bullet: EntityRole) -> bool {
        matches!(
            (self, bullet),
            (EntityRole::Player, EntityRole::EnemyBullet)
                | (EntityRole::Enemy, EntityRole::PlayerBullet)
        )
    }

    /// Bullet role for projectiles fired by an entity of this role.
    pub fn bullet_role(is_player: bool) -> EntityRole {
        if is_player {
            EntityRole::PlayerBullet
        } else {
            EntityRole::EnemyBullet
        }
    }
}

/// How an attack part resolves the direction of the bullet it spawns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleType {
    /// Aim at the target, then add the part's offset.
    AimAtPlayer,
    /// Spawner facing angle plus the part's offset.
    RelativeToParentRotation,
    /// The part's offset is the absolute angle.
    #[default]
    Absolute,
}

/// Top-level simulation phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Active,
    Paused,
}
