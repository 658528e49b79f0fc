//! Simulation engine for CIRCLEWAR.
//!
//! Owns the hecs ECS world, runs systems in a fixed per-tick order,
//! and produces `SimSnapshot`s for the renderer.

pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod map_area;
pub mod modifiers;
pub mod persistence;
pub mod scenario;
pub mod systems;
pub mod world_setup;

pub use circlewar_core as core;
pub use config::SimConfig;
pub use engine::SimulationEngine;
pub use error::SimError;

#[cfg(test)]
mod tests;
