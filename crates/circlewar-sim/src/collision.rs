//! Custom body-contact callbacks.
//!
//! Entities may carry a `CustomCollision` component. When two bodies touch,
//! the movement system hands each side's callback a `Contact` and collects
//! the `ContactEffect`s it pushes; effects are applied after resolution so
//! callbacks never observe a half-updated world.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use hecs::Entity;

use circlewar_core::enums::EntityRole;
use circlewar_core::types::CircleId;

/// One side's view of a body-on-body touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub this: Entity,
    pub this_role: EntityRole,
    pub this_circle: CircleId,
    pub this_origin: Vec2,
    pub other: Entity,
    pub other_role: EntityRole,
    pub other_circle: CircleId,
    pub other_origin: Vec2,
}

/// A deferred consequence of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEffect {
    Damage {
        target: Entity,
        circle: CircleId,
        amount: f32,
    },
    Knockback {
        target: Entity,
        impulse: Vec2,
    },
}

pub trait CollisionCallback: Send + Sync + fmt::Debug {
    fn on_contact(&self, contact: &Contact, effects: &mut Vec<ContactEffect>);
}

/// Component wrapping a shared collision callback.
#[derive(Debug, Clone)]
pub struct CustomCollision(pub Arc<dyn CollisionCallback>);

impl CustomCollision {
    pub fn new(callback: impl CollisionCallback + 'static) -> Self {
        Self(Arc::new(callback))
    }
}

/// Damages whichever circle it touches.
#[derive(Debug, Clone, Copy)]
pub struct ContactDamage {
    pub damage: f32,
}

impl CollisionCallback for ContactDamage {
    fn on_contact(&self, contact: &Contact, effects: &mut Vec<ContactEffect>) {
        effects.push(ContactEffect::Damage {
            target: contact.other,
            circle: contact.other_circle,
            amount: self.damage,
        });
    }
}

/// Pushes the other body away from this one.
#[derive(Debug, Clone, Copy)]
pub struct ContactKnockback {
    pub strength: f32,
}

impl CollisionCallback for ContactKnockback {
    fn on_contact(&self, contact: &Contact, effects: &mut Vec<ContactEffect>) {
        let away = (contact.other_origin - contact.this_origin).normalize_or_zero();
        effects.push(ContactEffect::Knockback {
            target: contact.other,
            impulse: away * self.strength,
        });
    }
}
