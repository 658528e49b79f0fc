//! Steering math shared by the strategies.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use circlewar_core::types::{angle_to, from_polar, inverse_lerp_clamped};

/// Velocity of magnitude `speed` from `position` toward `target`.
/// Zero when the two coincide.
pub fn seek(position: Vec2, target: Vec2, speed: f32) -> Vec2 {
    (target - position).normalize_or_zero() * speed
}

/// Speed that ramps linearly from `min_speed` at `min_distance` to
/// `max_speed` at `max_distance`, flat outside that band.
pub fn ramp_speed(
    distance: f32,
    min_speed: f32,
    max_speed: f32,
    min_distance: f32,
    max_distance: f32,
) -> f32 {
    let t = inverse_lerp_clamped(min_distance, max_distance, distance);
    min_speed + (max_speed - min_speed) * t
}

/// Half-width of the cone of directions from `position` that still hit a
/// circle of `radius` around `home`. `None` when `position` is inside it.
pub fn home_cone_half_angle(position: Vec2, home: Vec2, radius: f32) -> Option<f32> {
    let d = position.distance(home);
    if d <= radius {
        return None;
    }
    Some((radius / d).clamp(-1.0, 1.0).asin())
}

/// Pick a wander heading: uniform when inside the home circle, otherwise a
/// heading back into it.
pub fn wander_heading<R: Rng + ?Sized>(position: Vec2, home: Vec2, radius: f32, rng: &mut R) -> f32 {
    match home_cone_half_angle(position, home, radius) {
        Some(half) if half > 0.0 => {
            let toward = angle_to(position, home);
            rng.gen_range(toward - half..toward + half)
        }
        Some(_) => angle_to(position, home),
        None => rng.gen_range(0.0..TAU),
    }
}

/// Acceleration vector for a wander heading.
pub fn wander_acceleration(heading: f32, magnitude: f32) -> Vec2 {
    from_polar(heading, magnitude)
}

/// Uniform sample in `[lo, hi]`, tolerating a degenerate range.
pub fn sample_between<R: Rng + ?Sized>(lo: f32, hi: f32, rng: &mut R) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
