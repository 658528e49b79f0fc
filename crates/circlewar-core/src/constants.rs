//! Simulation constants and tuning parameters.

/// Nominal tick rate (Hz) used by the headless runner.
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the nominal tick rate.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// --- Hitbox layout ---

/// Slack added to `r1 + r2` when deciding whether two circles of one hitbox
/// are still physically joined.
pub const CIRCLE_TOUCH_EPSILON: f32 = 0.01;

/// Padding added to half the bounding box size to get the gravitational radius.
pub const GRAVITATIONAL_RADIUS_PADDING: f32 = 60.0;

// --- Map areas ---

/// Default radius of a map area.
pub const DEFAULT_MAP_AREA_RADIUS: f32 = 1000.0;

/// Distance at which a travelling entity counts as arrived.
pub const TRAVEL_ARRIVAL_DISTANCE: f32 = 1.0;

/// Default travel speed (units per frame) for map area transitions.
pub const DEFAULT_TRAVEL_SPEED: f32 = 12.0;

// --- Player defaults ---

pub const DEFAULT_PLAYER_MAX_SPEED: f32 = 6.0;
pub const DEFAULT_PLAYER_RADIUS: f32 = 20.0;
pub const DEFAULT_PLAYER_HEALTH: f32 = 100.0;

// --- Color tags ---

pub const PLAYER_COLOR: &str = "player";
pub const ENEMY_COLOR: &str = "enemy";
pub const PLAYER_BULLET_COLOR: &str = "player_bullet";
pub const ENEMY_BULLET_COLOR: &str = "enemy_bullet";

// --- Modifiers ---

/// Bullets in a death burst ring when a modifier does not say otherwise.
pub const DEATH_BURST_DEFAULT_COUNT: u32 = 8;

/// Intangibility granted to a player entering an area with an entry grace.
pub const ENTRY_GRACE_DEFAULT_SECS: f32 = 1.5;
