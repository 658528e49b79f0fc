//! Error types for hitbox and attack-pattern construction and firing.

use thiserror::Error;

/// Attack pattern construction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    /// Parts must be appended in non-decreasing delay order.
    #[error("attack part {index} has delay {delay}s, earlier than the previous part's {previous}s")]
    DelayOutOfOrder {
        index: usize,
        delay: f32,
        previous: f32,
    },
    #[error("attack part {index} has delay {delay}s; delays must be finite and non-negative")]
    InvalidDelay { index: usize, delay: f32 },
    #[error("attack pattern duration must be positive, got {0}s")]
    NonPositiveDuration(f32),
    #[error("attack state has {flags} fired flags for {parts} parts")]
    FiredFlagMismatch { flags: usize, parts: usize },
    #[error("attack clock {0}s is outside the pattern cycle")]
    ClockOutOfRange(f32),
}

/// Circle hitbox construction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HitboxError {
    #[error("circle radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("circle max health must be positive, got {0}")]
    NonPositiveHealth(f32),
    #[error("hitbox needs at least one circle")]
    NoCircles,
}

/// Attack part firing failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FireError {
    /// `AimAtPlayer` parts need a live target.
    #[error("attack part aims at the player but no target was supplied")]
    MissingTarget,
}
