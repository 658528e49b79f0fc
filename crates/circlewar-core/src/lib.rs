//! Core types and definitions for the CIRCLEWAR simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry helpers, the circle hitbox model, attack patterns, components,
//! commands, state snapshots, events, and constants.
//! It has no dependency on the ECS or any runtime framework.

pub mod attack;
pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod hitbox;
pub mod state;
pub mod types;
