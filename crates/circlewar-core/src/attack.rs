//! Attack patterns: declarative, looping bullet-spawn scripts owned by circles.
//!
//! An `AttackPattern` is an ordered list of `AttackPart`s plus a cycle
//! duration. Each circle that owns a pattern wraps it in an `AttackState`
//! which carries the cycle clock and one fired flag per part. The clock scan
//! relies on parts being sorted by delay, so `AttackPattern` rejects
//! out-of-order parts at construction.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::enums::{AngleType, EntityRole};
use crate::error::{FireError, PatternError};
use crate::types::{angle_to, from_polar, rotate, ColorTag, EntityId};

/// Angle offset of an attack part: fixed, or drawn uniformly from a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AngleSpec {
    Fixed(f32),
    Range { min: f32, max: f32 },
}

impl Default for AngleSpec {
    fn default() -> Self {
        AngleSpec::Fixed(0.0)
    }
}

impl AngleSpec {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            AngleSpec::Fixed(angle) => angle,
            AngleSpec::Range { min, max } if max > min => rng.gen_range(min..max),
            AngleSpec::Range { min, .. } => min,
        }
    }
}

/// One timed bullet-spawn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackPart {
    /// Seconds from the start of the pattern cycle.
    pub delay: f32,
    /// Spawn offset from the owning circle's center, in the hitbox's local frame.
    pub offset: Vec2,
    /// Bullet speed (units per frame).
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    /// Fraction of dealt damage returned to the shooter as healing.
    pub lifesteal_percent: f32,
    /// Homing strength toward the target; 0 disables homing.
    pub player_attraction_lerp_factor: f32,
    pub angle_type: AngleType,
    pub angle: AngleSpec,
    /// Overrides the default bullet color for the shooter's role.
    pub color: Option<ColorTag>,
}

impl Default for AttackPart {
    fn default() -> Self {
        Self {
            delay: 0.0,
            offset: Vec2::ZERO,
            speed: 5.0,
            radius: 6.0,
            damage: 1.0,
            lifesteal_percent: 0.0,
            player_attraction_lerp_factor: 0.0,
            angle_type: AngleType::default(),
            angle: AngleSpec::default(),
            color: None,
        }
    }
}

/// Everything an attack part needs to know about the shooter at fire time.
#[derive(Debug, Clone)]
pub struct FireRequest {
    /// `None` for world-sourced bullets.
    pub source: Option<EntityId>,
    pub source_is_player: bool,
    /// Required for `AngleType::AimAtPlayer`.
    pub target: Option<Vec2>,
    /// World-space center of the firing circle.
    pub origin: Vec2,
    pub facing_angle: f32,
    /// Radius of the enclosing map area; bounds homing bullet lifetime.
    pub map_area_radius: f32,
    pub default_color: ColorTag,
}

/// A fully resolved bullet, ready for the entity factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletSpawn {
    pub source: Option<EntityId>,
    pub role: EntityRole,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: ColorTag,
    pub damage: f32,
    pub lifesteal_percent: f32,
    pub attraction_lerp_factor: f32,
    /// Seconds until the bullet expires; `None` lives until it leaves the area.
    pub lifetime_secs: Option<f32>,
}

impl AttackPart {
    /// Resolve this part into a bullet.
    pub fn fire<R: Rng + ?Sized>(
        &self,
        request: &FireRequest,
        rng: &mut R,
    ) -> Result<BulletSpawn, FireError> {
        let origin = request.origin + rotate(self.offset, -request.facing_angle);
        let offset = self.angle.sample(rng);

        let angle = match self.angle_type {
            AngleType::AimAtPlayer => {
                let target = request.target.ok_or(FireError::MissingTarget)?;
                angle_to(origin, target) + offset
            }
            AngleType::RelativeToParentRotation => request.facing_angle + offset,
            AngleType::Absolute => offset,
        };

        let lifetime_secs = if self.player_attraction_lerp_factor != 0.0 {
            Some(homing_lifetime(request.map_area_radius, self.speed))
        } else {
            None
        };

        Ok(BulletSpawn {
            source: request.source,
            role: EntityRole::bullet_role(request.source_is_player),
            origin,
            velocity: from_polar(angle, self.speed),
            radius: self.radius,
            color: self
                .color
                .clone()
                .unwrap_or_else(|| request.default_color.clone()),
            damage: self.damage,
            lifesteal_percent: self.lifesteal_percent,
            attraction_lerp_factor: self.player_attraction_lerp_factor,
            lifetime_secs,
        })
    }
}

/// Upper bound on a homing bullet's life: long enough to cross the area twice.
pub fn homing_lifetime(map_area_radius: f32, speed: f32) -> f32 {
    2.0 * map_area_radius / speed.abs().max(f32::EPSILON)
}

/// Ordered list of attack parts that loops every `duration` seconds.
///
/// Deserialization goes through `from_parts`, so loaded patterns obey the
/// same ordering and duration rules as built ones. Totals are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatternFields")]
pub struct AttackPattern {
    duration: f32,
    parts: Vec<AttackPart>,
    #[serde(skip_serializing)]
    total_damage: f32,
    #[serde(skip_serializing)]
    total_radius: f32,
}

#[derive(Deserialize)]
struct PatternFields {
    duration: f32,
    #[serde(default)]
    parts: Vec<AttackPart>,
}

impl TryFrom<PatternFields> for AttackPattern {
    type Error = PatternError;

    fn try_from(fields: PatternFields) -> Result<Self, Self::Error> {
        Self::from_parts(fields.duration, fields.parts)
    }
}

impl AttackPattern {
    /// Empty pattern with the given cycle duration.
    pub fn new(duration: f32) -> Result<Self, PatternError> {
        if duration <= 0.0 || !duration.is_finite() {
            return Err(PatternError::NonPositiveDuration(duration));
        }
        Ok(Self {
            duration,
            parts: Vec::new(),
            total_damage: 0.0,
            total_radius: 0.0,
        })
    }

    /// Build a pattern from parts already sorted by delay.
    pub fn from_parts(
        duration: f32,
        parts: impl IntoIterator<Item = AttackPart>,
    ) -> Result<Self, PatternError> {
        let mut pattern = Self::new(duration)?;
        for part in parts {
            pattern.add_part(part)?;
        }
        Ok(pattern)
    }

    /// Append a part. Its delay must not precede the last part's delay.
    pub fn add_part(&mut self, part: AttackPart) -> Result<(), PatternError> {
        let index = self.parts.len();
        if !(part.delay >= 0.0 && part.delay.is_finite()) {
            return Err(PatternError::InvalidDelay {
                index,
                delay: part.delay,
            });
        }
        if let Some(last) = self.parts.last() {
            if part.delay < last.delay {
                log::warn!(
                    "rejecting attack part {index}: delay {}s precedes {}s",
                    part.delay,
                    last.delay
                );
                return Err(PatternError::DelayOutOfOrder {
                    index,
                    delay: part.delay,
                    previous: last.delay,
                });
            }
        }
        self.parts.push(part);
        self.recompute_totals();
        Ok(())
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn parts(&self) -> &[AttackPart] {
        &self.parts
    }

    pub fn total_damage(&self) -> f32 {
        self.total_damage
    }

    pub fn total_radius(&self) -> f32 {
        self.total_radius
    }

    /// Multiply every part's bullet stats. Applied once, at enemy spawn.
    pub fn scale_stats(&mut self, radius: f32, speed: f32, damage: f32) {
        for part in &mut self.parts {
            part.radius *= radius;
            part.speed *= speed;
            part.damage *= damage;
        }
        self.recompute_totals();
    }

    fn recompute_totals(&mut self) {
        self.total_damage = self.parts.iter().map(|p| p.damage).sum();
        self.total_radius = self.parts.iter().map(|p| p.radius).sum();
    }
}

/// A pattern plus its firing clock, owned by one circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateFields")]
pub struct AttackState {
    pattern: AttackPattern,
    time: f32,
    fired: Vec<bool>,
}

#[derive(Deserialize)]
struct StateFields {
    pattern: AttackPattern,
    time: f32,
    fired: Vec<bool>,
}

impl TryFrom<StateFields> for AttackState {
    type Error = PatternError;

    fn try_from(fields: StateFields) -> Result<Self, Self::Error> {
        let parts = fields.pattern.parts.len();
        if fields.fired.len() != parts {
            return Err(PatternError::FiredFlagMismatch {
                flags: fields.fired.len(),
                parts,
            });
        }
        if !(fields.time >= 0.0 && fields.time <= fields.pattern.duration) {
            return Err(PatternError::ClockOutOfRange(fields.time));
        }
        Ok(Self {
            pattern: fields.pattern,
            time: fields.time,
            fired: fields.fired,
        })
    }
}

impl AttackState {
    pub fn new(pattern: AttackPattern) -> Self {
        let fired = vec![false; pattern.parts.len()];
        Self {
            pattern,
            time: 0.0,
            fired,
        }
    }

    pub fn pattern(&self) -> &AttackPattern {
        &self.pattern
    }

    /// Seconds since the current cycle started.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn fired(&self) -> &[bool] {
        &self.fired
    }

    /// Advance the clock and return the indices of parts due this frame.
    ///
    /// Scans forward from the first unfired part and stops at the first part
    /// whose delay is still in the future. When the cycle ends the flags are
    /// cleared and the clock wraps, so at most one pass happens per call no
    /// matter how large `dt` is.
    pub fn advance(&mut self, dt: f32) -> Vec<usize> {
        self.time += dt;

        let mut due = Vec::new();
        if let Some(start) = self.fired.iter().position(|fired| !fired) {
            for index in start..self.pattern.parts.len() {
                if self.pattern.parts[index].delay > self.time {
                    break;
                }
                if !self.fired[index] {
                    self.fired[index] = true;
                    due.push(index);
                }
            }
        }

        if self.time >= self.pattern.duration {
            self.fired.iter_mut().for_each(|fired| *fired = false);
            self.time = self.time.rem_euclid(self.pattern.duration);
        }

        due
    }

    /// Restart the cycle from zero.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.fired.iter_mut().for_each(|fired| *fired = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn part_at(delay: f32) -> AttackPart {
        AttackPart {
            delay,
            ..Default::default()
        }
    }

    fn request() -> FireRequest {
        FireRequest {
            source: Some(EntityId(7)),
            source_is_player: false,
            target: Some(Vec2::new(100.0, 0.0)),
            origin: Vec2::ZERO,
            facing_angle: 0.0,
            map_area_radius: 100.0,
            default_color: ColorTag::new("enemy_bullet"),
        }
    }

    #[test]
    fn test_ascending_delay_firing_cycle() {
        let pattern =
            AttackPattern::from_parts(2.0, [part_at(0.0), part_at(0.5), part_at(1.2)]).unwrap();
        let mut state = AttackState::new(pattern);

        let mut fires: Vec<(u32, usize)> = Vec::new();
        let mut reset_step = None;
        for step in 1..=25u32 {
            for index in state.advance(0.1) {
                fires.push((step, index));
            }
            if reset_step.is_none() && state.fired().iter().all(|f| !f) && step > 1 {
                reset_step = Some(step);
                assert!(state.time() < 0.2, "clock should wrap, got {}", state.time());
            }
        }

        assert_eq!(fires[0], (1, 0));
        assert_eq!(fires[1].1, 1);
        assert!((5..=6).contains(&fires[1].0), "part 1 fired at step {}", fires[1].0);
        assert_eq!(fires[2].1, 2);
        assert!((12..=13).contains(&fires[2].0), "part 2 fired at step {}", fires[2].0);

        let reset_step = reset_step.expect("cycle should reset");
        assert!((20..=21).contains(&reset_step), "reset at step {reset_step}");

        // Second cycle starts over with part 0.
        assert_eq!(fires[3].1, 0);
        assert_eq!(fires[3].0, reset_step + 1);
    }

    #[test]
    fn test_large_dt_fires_at_most_one_pass() {
        let pattern =
            AttackPattern::from_parts(1.0, [part_at(0.0), part_at(0.5), part_at(0.9)]).unwrap();
        let mut state = AttackState::new(pattern);

        let due = state.advance(5.5);
        assert_eq!(due, vec![0, 1, 2]);
        assert!(state.fired().iter().all(|f| !f));
        assert!((state.time() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_out_of_order_delay_rejected() {
        let err = AttackPattern::from_parts(2.0, [part_at(0.5), part_at(0.2)]).unwrap_err();
        assert_eq!(
            err,
            PatternError::DelayOutOfOrder {
                index: 1,
                delay: 0.2,
                previous: 0.5
            }
        );
        assert!(AttackPattern::new(0.0).is_err());
        assert!(matches!(
            AttackPattern::from_parts(1.0, [part_at(f32::NAN)]),
            Err(PatternError::InvalidDelay { index: 0, .. })
        ));
    }

    #[test]
    fn test_deserialize_validates_pattern() {
        let out_of_order = r#"{ "duration": 2.0, "parts": [{ "delay": 1.0 }, { "delay": 0.2 }] }"#;
        assert!(serde_json::from_str::<AttackPattern>(out_of_order).is_err());

        let zero = r#"{ "duration": 0.0, "parts": [{ "delay": 0.0 }] }"#;
        assert!(serde_json::from_str::<AttackPattern>(zero).is_err());

        // Stored totals are ignored and recomputed from the parts.
        let json = r#"{ "duration": 1.0, "total_damage": 99.0,
                        "parts": [{ "damage": 2.0 }, { "delay": 0.5, "damage": 3.0 }] }"#;
        let pattern: AttackPattern = serde_json::from_str(json).unwrap();
        assert!((pattern.total_damage() - 5.0).abs() < 1e-6);
        assert!(!serde_json::to_string(&pattern).unwrap().contains("total_damage"));
    }

    #[test]
    fn test_deserialize_validates_state() {
        let pattern = AttackPattern::from_parts(1.0, [part_at(0.0), part_at(0.5)]).unwrap();
        let mut state = AttackState::new(pattern);
        state.advance(0.25);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<AttackState>(&json).unwrap(), state);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["fired"] = serde_json::json!([true]);
        assert!(serde_json::from_value::<AttackState>(value.clone()).is_err());

        value["fired"] = serde_json::json!([true, false]);
        value["time"] = serde_json::json!(3.0);
        assert!(serde_json::from_value::<AttackState>(value).is_err());
    }

    #[test]
    fn test_totals_follow_parts() {
        let mut pattern = AttackPattern::new(1.0).unwrap();
        pattern
            .add_part(AttackPart {
                damage: 3.0,
                radius: 4.0,
                ..Default::default()
            })
            .unwrap();
        pattern
            .add_part(AttackPart {
                delay: 0.5,
                damage: 2.0,
                radius: 6.0,
                ..Default::default()
            })
            .unwrap();
        assert!((pattern.total_damage() - 5.0).abs() < 1e-6);
        assert!((pattern.total_radius() - 10.0).abs() < 1e-6);

        pattern.scale_stats(2.0, 1.0, 3.0);
        assert!((pattern.total_damage() - 15.0).abs() < 1e-6);
        assert!((pattern.total_radius() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_aim_at_player_needs_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let part = AttackPart {
            angle_type: AngleType::AimAtPlayer,
            ..Default::default()
        };
        let mut req = request();
        req.target = None;
        assert_eq!(part.fire(&req, &mut rng), Err(FireError::MissingTarget));
    }

    #[test]
    fn test_aim_at_player_points_at_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let part = AttackPart {
            angle_type: AngleType::AimAtPlayer,
            speed: 10.0,
            ..Default::default()
        };
        let mut req = request();
        req.target = Some(Vec2::new(0.0, 50.0));
        let bullet = part.fire(&req, &mut rng).unwrap();
        assert!(bullet.velocity.x.abs() < 1e-4);
        assert!((bullet.velocity.y - 10.0).abs() < 1e-4);
        assert_eq!(bullet.role, EntityRole::EnemyBullet);
        assert_eq!(bullet.lifetime_secs, None);
    }

    #[test]
    fn test_relative_rotation_uses_facing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let part = AttackPart {
            angle_type: AngleType::RelativeToParentRotation,
            angle: AngleSpec::Fixed(std::f32::consts::FRAC_PI_2),
            speed: 1.0,
            ..Default::default()
        };
        let mut req = request();
        req.facing_angle = std::f32::consts::FRAC_PI_2;
        req.source_is_player = true;
        let bullet = part.fire(&req, &mut rng).unwrap();
        assert!((bullet.velocity.x + 1.0).abs() < 1e-4);
        assert!(bullet.velocity.y.abs() < 1e-4);
        assert_eq!(bullet.role, EntityRole::PlayerBullet);
    }

    #[test]
    fn test_random_range_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let part = AttackPart {
            angle: AngleSpec::Range { min: 0.2, max: 0.4 },
            speed: 1.0,
            ..Default::default()
        };
        for _ in 0..100 {
            let bullet = part.fire(&request(), &mut rng).unwrap();
            let angle = bullet.velocity.y.atan2(bullet.velocity.x);
            assert!((0.2 - 1e-4..0.4 + 1e-4).contains(&angle), "angle {angle}");
        }
    }

    #[test]
    fn test_homing_lifetime_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let part = AttackPart {
            speed: 10.0,
            player_attraction_lerp_factor: 0.2,
            ..Default::default()
        };
        let bullet = part.fire(&request(), &mut rng).unwrap();
        let lifetime = bullet.lifetime_secs.expect("homing bullets expire");
        assert!((lifetime - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_color_override() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let part = AttackPart {
            color: Some(ColorTag::new("gold")),
            ..Default::default()
        };
        assert_eq!(part.fire(&request(), &mut rng).unwrap().color.as_str(), "gold");
        let plain = AttackPart::default();
        assert_eq!(
            plain.fire(&request(), &mut rng).unwrap().color.as_str(),
            "enemy_bullet"
        );
    }
}
