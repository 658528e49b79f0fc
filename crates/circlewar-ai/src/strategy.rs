//! Steering strategies.
//!
//! Each strategy reads an `AiContext` and returns an `AiUpdate`. The caller
//! owns applying the update: velocity and acceleration go into the hitbox,
//! and a facing angle (if any) goes through `set_last_faced_angle`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use circlewar_core::types::angle_to;

use crate::steering::{ramp_speed, sample_between, seek, wander_acceleration, wander_heading};

/// Input to a strategy for one entity.
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub position: Vec2,
    pub velocity: Vec2,
    pub max_speed: f32,
    /// The player's origin, when there is a live player.
    pub target: Option<Vec2>,
    pub dt: f32,
}

/// Output of a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiUpdate {
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub facing_angle: Option<f32>,
}

/// Charge straight at the target at full speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowAi;

/// Approach the target, slowing down as it gets close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalkAi {
    pub min_speed: f32,
    /// At or under this distance the stalker moves at `min_speed`.
    pub min_speed_distance: f32,
    /// At or beyond this distance the stalker moves at max speed.
    pub max_speed_distance: f32,
}

/// Drift around a home point, changing direction at random intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderAi {
    pub home: Vec2,
    pub radius: f32,
    pub min_interval: f32,
    pub max_interval: f32,
    pub min_acceleration: f32,
    pub max_acceleration: f32,
    /// Seconds until the next heading change.
    #[serde(default)]
    pub timer: f32,
    #[serde(default)]
    pub acceleration: Vec2,
}

impl WanderAi {
    pub fn new(home: Vec2, radius: f32) -> Self {
        Self {
            home,
            radius,
            min_interval: 0.5,
            max_interval: 2.0,
            min_acceleration: 0.05,
            max_acceleration: 0.2,
            timer: 0.0,
            acceleration: Vec2::ZERO,
        }
    }
}

/// Steering behavior attached to an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiStrategy {
    Follow(FollowAi),
    Stalk(StalkAi),
    Wander(WanderAi),
}

impl AiStrategy {
    pub fn follow() -> Self {
        AiStrategy::Follow(FollowAi)
    }

    pub fn stalk(min_speed: f32, min_speed_distance: f32, max_speed_distance: f32) -> Self {
        AiStrategy::Stalk(StalkAi {
            min_speed,
            min_speed_distance,
            max_speed_distance,
        })
    }

    pub fn wander(home: Vec2, radius: f32) -> Self {
        AiStrategy::Wander(WanderAi::new(home, radius))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AiStrategy::Follow(_) => "follow",
            AiStrategy::Stalk(_) => "stalk",
            AiStrategy::Wander(_) => "wander",
        }
    }

    /// Run one tick of the strategy.
    pub fn update<R: Rng + ?Sized>(&mut self, ctx: &AiContext, rng: &mut R) -> AiUpdate {
        let facing_angle = ctx.target.map(|target| angle_to(ctx.position, target));

        match self {
            AiStrategy::Follow(_) => AiUpdate {
                velocity: ctx
                    .target
                    .map_or(Vec2::ZERO, |t| seek(ctx.position, t, ctx.max_speed)),
                acceleration: Vec2::ZERO,
                facing_angle,
            },
            AiStrategy::Stalk(stalk) => {
                let velocity = match ctx.target {
                    Some(target) => {
                        let speed = ramp_speed(
                            ctx.position.distance(target),
                            stalk.min_speed,
                            ctx.max_speed,
                            stalk.min_speed_distance,
                            stalk.max_speed_distance,
                        );
                        seek(ctx.position, target, speed)
                    }
                    None => Vec2::ZERO,
                };
                AiUpdate {
                    velocity,
                    acceleration: Vec2::ZERO,
                    facing_angle,
                }
            }
            AiStrategy::Wander(wander) => {
                wander.timer -= ctx.dt;
                if wander.timer <= 0.0 {
                    wander.timer =
                        sample_between(wander.min_interval, wander.max_interval, rng).max(ctx.dt);
                    let heading = wander_heading(ctx.position, wander.home, wander.radius, rng);
                    let magnitude =
                        sample_between(wander.min_acceleration, wander.max_acceleration, rng);
                    wander.acceleration = wander_acceleration(heading, magnitude);
                }
                AiUpdate {
                    velocity: ctx.velocity,
                    acceleration: wander.acceleration,
                    facing_angle,
                }
            }
        }
    }
}
