//! Composite circular hitboxes.
//!
//! A `HitboxComponent` owns an ordered list of `CircleHitbox`es positioned
//! relative to the entity origin. Each circle keeps an immutable
//! `original_position`; its current position is always recomputed as that
//! original rotated by `-last_faced_angle`, never rotated incrementally.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::attack::{AttackPattern, AttackState};
use crate::constants::{CIRCLE_TOUCH_EPSILON, GRAVITATIONAL_RADIUS_PADDING};
use crate::error::HitboxError;
use crate::types::{circles_touch, rotate, CircleId, ColorTag};

/// A single circular sub-hitbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleHitbox {
    id: CircleId,
    position: Vec2,
    original_position: Vec2,
    radius: f32,
    health: f32,
    max_health: f32,
    color: ColorTag,
    attack: Option<AttackState>,
}

impl CircleHitbox {
    /// New circle at full health. The id is assigned when added to a hitbox.
    pub fn new(
        position: Vec2,
        radius: f32,
        max_health: f32,
        color: ColorTag,
    ) -> Result<Self, HitboxError> {
        if radius <= 0.0 || !radius.is_finite() {
            return Err(HitboxError::NonPositiveRadius(radius));
        }
        if max_health <= 0.0 || !max_health.is_finite() {
            return Err(HitboxError::NonPositiveHealth(max_health));
        }
        Ok(Self {
            id: CircleId(0),
            position,
            original_position: position,
            radius,
            health: max_health,
            max_health,
            color,
            attack: None,
        })
    }

    pub fn with_attack_pattern(mut self, pattern: AttackPattern) -> Self {
        self.attack = Some(AttackState::new(pattern));
        self
    }

    pub fn id(&self) -> CircleId {
        self.id
    }

    /// Current position relative to the entity origin.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Unrotated reference position.
    pub fn original_position(&self) -> Vec2 {
        self.original_position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn color(&self) -> &ColorTag {
        &self.color
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn attack(&self) -> Option<&AttackState> {
        self.attack.as_ref()
    }

    /// Subtract `amount` from health. Returns true once health reaches zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.is_dead()
    }

    /// Restore up to `amount` health; returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let restored = amount.max(0.0).min(self.max_health - self.health).max(0.0);
        self.health += restored;
        restored
    }

    /// Advance the attack clock; returns the part indices due this frame.
    pub fn tick_attack(&mut self, dt: f32) -> Vec<usize> {
        match self.attack.as_mut() {
            Some(attack) => attack.advance(dt),
            None => Vec::new(),
        }
    }

    fn apply_rotation(&mut self, angle: f32) {
        self.position = rotate(self.original_position, -angle);
    }
}

/// Guided transit used when an entity crosses between map areas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Travel {
    pub destination: Vec2,
    /// Units per frame.
    pub speed: f32,
}

/// Physical extent and motion state of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxComponent {
    origin: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    max_speed: f32,
    last_faced_angle: f32,
    intangible: bool,
    shooting: bool,
    travel: Option<Travel>,
    circles: Vec<CircleHitbox>,
    pending_removals: Vec<CircleId>,
    gravitational_radius: f32,
    next_circle_id: u32,
}

impl HitboxComponent {
    pub fn new(origin: Vec2, max_speed: f32) -> Self {
        Self {
            origin,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_speed,
            last_faced_angle: 0.0,
            intangible: false,
            shooting: false,
            travel: None,
            circles: Vec::new(),
            pending_removals: Vec::new(),
            gravitational_radius: GRAVITATIONAL_RADIUS_PADDING,
            next_circle_id: 0,
        }
    }

    // --- Motion ---

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = acceleration;
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.max_speed = max_speed;
    }

    /// Move to `origin + velocity`, then apply acceleration to velocity.
    /// Velocity is clamped to `max_speed` when `clamp` is set and the limit is positive.
    pub fn commit_movement(&mut self, candidate: Vec2, clamp: bool) {
        self.origin = candidate;
        self.velocity += self.acceleration;
        if clamp && self.max_speed > 0.0 {
            self.velocity = self.velocity.clamp_length_max(self.max_speed);
        }
    }

    pub fn last_faced_angle(&self) -> f32 {
        self.last_faced_angle
    }

    /// Face `angle` and relayout every circle from its original position.
    pub fn set_last_faced_angle(&mut self, angle: f32) {
        self.last_faced_angle = angle;
        for circle in &mut self.circles {
            circle.apply_rotation(angle);
        }
    }

    pub fn is_intangible(&self) -> bool {
        self.intangible
    }

    pub fn set_intangible(&mut self, intangible: bool) {
        self.intangible = intangible;
    }

    pub fn is_shooting(&self) -> bool {
        self.shooting
    }

    pub fn set_shooting(&mut self, shooting: bool) {
        self.shooting = shooting;
    }

    pub fn travel(&self) -> Option<Travel> {
        self.travel
    }

    /// Begin an obstacle-ignoring transit toward `destination`.
    pub fn start_travel(&mut self, destination: Vec2, speed: f32) {
        self.travel = Some(Travel { destination, speed });
        self.intangible = true;
        self.acceleration = Vec2::ZERO;
    }

    /// End transit: tangible again and at rest.
    pub fn finish_travel(&mut self) {
        self.travel = None;
        self.intangible = false;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }

    pub fn gravitational_radius(&self) -> f32 {
        self.gravitational_radius
    }

    // --- Circles ---

    /// Add a circle, laid out for the current facing angle. Returns its id.
    pub fn add_circle(&mut self, mut circle: CircleHitbox) -> CircleId {
        let id = CircleId(self.next_circle_id);
        self.next_circle_id += 1;
        circle.id = id;
        circle.apply_rotation(self.last_faced_angle);
        self.circles.push(circle);
        id
    }

    /// Take over a circle from another hitbox, keeping its id.
    fn adopt_circle(&mut self, mut circle: CircleHitbox) {
        self.next_circle_id = self.next_circle_id.max(circle.id.0 + 1);
        circle.apply_rotation(self.last_faced_angle);
        self.circles.push(circle);
    }

    pub fn circles(&self) -> &[CircleHitbox] {
        &self.circles
    }

    pub fn circles_mut(&mut self) -> &mut [CircleHitbox] {
        &mut self.circles
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    pub fn circle(&self, id: CircleId) -> Option<&CircleHitbox> {
        self.circles.iter().find(|c| c.id == id)
    }

    pub fn circle_mut(&mut self, id: CircleId) -> Option<&mut CircleHitbox> {
        self.circles.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_circle(&mut self, id: CircleId) -> Option<CircleHitbox> {
        let index = self.circles.iter().position(|c| c.id == id)?;
        Some(self.circles.remove(index))
    }

    /// World-space center of a circle.
    pub fn circle_world_position(&self, circle: &CircleHitbox) -> Vec2 {
        self.origin + circle.position
    }

    pub fn total_radius(&self) -> f32 {
        self.circles.iter().map(|c| c.radius).sum()
    }

    pub fn total_health(&self) -> f32 {
        self.circles.iter().map(|c| c.health.max(0.0)).sum()
    }

    /// Queue a circle for removal at the end of the pass. Re-queuing is a no-op.
    pub fn queue_circle_removal(&mut self, id: CircleId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    pub fn has_pending_removals(&self) -> bool {
        !self.pending_removals.is_empty()
    }

    pub fn take_pending_removals(&mut self) -> Vec<CircleId> {
        std::mem::take(&mut self.pending_removals)
    }

    /// Spread `amount` healing over the circles in order. Returns the amount used.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let mut remaining = amount.max(0.0);
        for circle in &mut self.circles {
            if remaining <= 0.0 {
                break;
            }
            if circle.is_dead() {
                continue;
            }
            remaining -= circle.heal(remaining);
        }
        amount.max(0.0) - remaining
    }

    /// Shift original positions so their bounding box is centered on the
    /// origin, and recompute the gravitational radius.
    ///
    /// The origin moves by the same (rotated) shift, so world-space circle
    /// positions do not change.
    pub fn recenter_original_circle_positions(&mut self) {
        if self.circles.is_empty() {
            self.gravitational_radius = GRAVITATIONAL_RADIUS_PADDING;
            return;
        }

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for circle in &self.circles {
            min = min.min(circle.original_position - Vec2::splat(circle.radius));
            max = max.max(circle.original_position + Vec2::splat(circle.radius));
        }
        let center = (min + max) * 0.5;
        let size = max - min;

        for circle in &mut self.circles {
            circle.original_position -= center;
            circle.apply_rotation(self.last_faced_angle);
        }
        self.origin += rotate(center, -self.last_faced_angle);
        self.gravitational_radius = size.max_element() * 0.5 + GRAVITATIONAL_RADIUS_PADDING;
    }

    // --- Fragmentation ---

    /// Indices of the circles connected to circle 0, transitively.
    pub fn connected_to_first(&self) -> Vec<usize> {
        let n = self.circles.len();
        if n == 0 {
            return Vec::new();
        }

        let mut visited = vec![false; n];
        let mut queue = VecDeque::from([0usize]);
        visited[0] = true;
        while let Some(current) = queue.pop_front() {
            let a = &self.circles[current];
            for (other, b) in self.circles.iter().enumerate() {
                if visited[other] {
                    continue;
                }
                if circles_touch(
                    a.original_position,
                    a.radius,
                    b.original_position,
                    b.radius,
                    CIRCLE_TOUCH_EPSILON,
                ) {
                    visited[other] = true;
                    queue.push_back(other);
                }
            }
        }

        (0..n).filter(|&i| visited[i]).collect()
    }

    /// The group of circle indices to peel into a new entity, if the hitbox
    /// has come apart.
    ///
    /// Compares the group connected to circle 0 against the rest and returns
    /// whichever has the smaller total radius. Ties peel the rest, so the
    /// group holding circle 0 stays with this entity.
    pub fn find_split_group(&self) -> Option<Vec<usize>> {
        if self.circles.len() < 2 {
            return None;
        }
        let connected = self.connected_to_first();
        if connected.is_empty() || connected.len() == self.circles.len() {
            return None;
        }

        let rest: Vec<usize> = (0..self.circles.len())
            .filter(|i| !connected.contains(i))
            .collect();
        let radius_of = |group: &[usize]| group.iter().map(|&i| self.circles[i].radius).sum::<f32>();

        if radius_of(&connected) < radius_of(&rest) {
            Some(connected)
        } else {
            Some(rest)
        }
    }

    /// Move the given circles into a new hitbox that shares this one's
    /// origin, facing, and motion. The new hitbox is recentered; this one is
    /// left for the caller to recenter once all splits are done.
    pub fn split_off(&mut self, indices: &[usize]) -> HitboxComponent {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut taken = Vec::with_capacity(sorted.len());
        for &index in sorted.iter().rev() {
            if index < self.circles.len() {
                taken.push(self.circles.remove(index));
            }
        }
        taken.reverse();

        let mut piece = HitboxComponent::new(self.origin, self.max_speed);
        piece.velocity = self.velocity;
        piece.last_faced_angle = self.last_faced_angle;
        piece.shooting = self.shooting;
        for circle in taken {
            piece.adopt_circle(circle);
        }
        piece.recenter_original_circle_positions();
        piece
    }

    // --- Persistence ---

    /// Serializable snapshot sufficient to rebuild this hitbox.
    pub fn to_save(&self) -> HitboxSave {
        HitboxSave {
            origin: self.origin,
            max_speed: self.max_speed,
            facing_angle: self.last_faced_angle,
            shooting: self.shooting,
            circles: self
                .circles
                .iter()
                .map(|c| CircleSave {
                    original_position: c.original_position,
                    radius: c.radius,
                    health: c.health,
                    max_health: c.max_health,
                    color: c.color.clone(),
                    attack: c.attack.as_ref().map(|a| a.pattern().clone()),
                })
                .collect(),
        }
    }

    /// Rebuild through the same add / recenter / place sequence used at spawn.
    pub fn from_save(save: &HitboxSave) -> Result<Self, HitboxError> {
        if save.circles.is_empty() {
            return Err(HitboxError::NoCircles);
        }
        let mut hitbox = HitboxComponent::new(Vec2::ZERO, save.max_speed);
        for saved in &save.circles {
            let mut circle = CircleHitbox::new(
                saved.original_position,
                saved.radius,
                saved.max_health,
                saved.color.clone(),
            )?;
            circle.health = saved.health.min(saved.max_health);
            if let Some(pattern) = &saved.attack {
                circle = circle.with_attack_pattern(pattern.clone());
            }
            hitbox.add_circle(circle);
        }
        hitbox.recenter_original_circle_positions();
        hitbox.set_origin(save.origin);
        hitbox.set_last_faced_angle(save.facing_angle);
        hitbox.set_shooting(save.shooting);
        Ok(hitbox)
    }
}

/// Saved form of one circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleSave {
    pub original_position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: ColorTag,
    pub attack: Option<AttackPattern>,
}

/// Saved form of a hitbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxSave {
    pub origin: Vec2,
    pub max_speed: f32,
    pub facing_angle: f32,
    #[serde(default)]
    pub shooting: bool,
    pub circles: Vec<CircleSave>,
}
