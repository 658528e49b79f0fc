//! Fundamental geometric and simulation types.
//!
//! All vectors are `glam::Vec2` in world units. Angles are radians measured
//! counter-clockwise from +x, as returned by `atan2(y, x)`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier for an entity, as exposed outside the ECS.
///
/// The simulation crate maps these to and from `hecs::Entity` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Identifier of a circle, unique within its owning hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CircleId(pub u32);

/// Identifier of a map area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapAreaId(pub u32);

/// Texture / color tag handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorTag(pub String);

impl ColorTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.tick += 1;
        self.elapsed_secs += dt as f64;
    }
}

/// Angle of the vector pointing from `from` to `to`.
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Vector of length `magnitude` pointing along `angle`.
#[inline]
pub fn from_polar(angle: f32, magnitude: f32) -> Vec2 {
    Vec2::from_angle(angle) * magnitude
}

/// Rotate `v` by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Normalize an angle into `[-π, π)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Whether two circles are close enough to count as physically joined.
#[inline]
pub fn circles_touch(a: Vec2, ra: f32, b: Vec2, rb: f32, epsilon: f32) -> bool {
    a.distance(b) < ra + rb + epsilon
}

/// Whether two circles overlap (strictly).
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Linear interpolation of `t` in `[lo, hi]` mapped to `[0, 1]`, clamped.
#[inline]
pub fn inverse_lerp_clamped(lo: f32, hi: f32, t: f32) -> f32 {
    if hi <= lo {
        return if t >= hi { 1.0 } else { 0.0 };
    }
    ((t - lo) / (hi - lo)).clamp(0.0, 1.0)
}
