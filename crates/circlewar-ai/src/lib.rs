//! Enemy steering AI for CIRCLEWAR.
//!
//! Implements the follow, stalk and wander strategies as pure functions of
//! an `AiContext`. No ECS dependency: the simulation builds a context per
//! entity, calls `AiStrategy::update`, and writes the result back into the
//! entity's hitbox.

pub mod steering;
pub mod strategy;

pub use circlewar_core as core;
pub use strategy::{AiContext, AiStrategy, AiUpdate, FollowAi, StalkAi, WanderAi};

#[cfg(test)]
mod tests;
