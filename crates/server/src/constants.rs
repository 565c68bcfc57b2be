//! Game constants.
//!
//! These are part of the client contract (clients mirror them to render and
//! to extrapolate between `cell_updated` frames) and are not runtime-tunable.

/// World bounds.
pub const WORLD_WIDTH: f64 = 5000.0;
pub const WORLD_HEIGHT: f64 = 5000.0;

/// Cell radius bounds; `set_mass` clamps into this range.
pub const MIN_CELL_RADIUS: f64 = 10.0;
pub const MAX_CELL_RADIUS: f64 = 2500.0;
/// Radius of a freshly spawned player cell.
pub const START_RADIUS: f64 = 20.0;

/// Radius of natural food; ejected food scales with its mass.
pub const FOOD_RADIUS: f64 = 5.0;
pub const MAX_FOOD_COUNT: usize = 3000;
/// Seconds after spawning during which food cannot be eaten.
pub const FOOD_GRACE: f64 = 0.2;

pub const PLAYER_MAX_CELLS: usize = 16;

// Physics
pub const BASE_SPEED: f64 = 600.0;
pub const SPEED_DECAY: f64 = 0.3;
/// Seconds before a cell may split again.
pub const SPLIT_COOLDOWN: f64 = 0.5;
/// Seconds before sibling cells may merge back.
pub const MERGE_COOLDOWN: f64 = 15.0;
pub const EJECT_MASS: f64 = 12.0;
pub const EJECT_SPEED: f64 = 1200.0;
/// Impulse given to a freshly split cell, reported to clients for animation.
pub const SPLIT_IMPULSE: f64 = 800.0;

// Gameplay
/// A cell must be this factor heavier to eat another.
pub const MASS_TO_EAT: f64 = 1.15;
/// Simulation steps per second.
pub const TICK_RATE: u32 = 30;
/// Fixed timestep, seconds.
pub const TICK_DT: f64 = 1.0 / TICK_RATE as f64;

// Mass degradation above the safe threshold. The constants were tuned
// empirically and clients extrapolate against them.
pub const SAFE_MASS_THRESHOLD: f64 = 100.0;
pub const DEGRADATION_LINEAR: f64 = 2e-4;
pub const DEGRADATION_QUADRATIC: f64 = 5e-6;

/// Ticks between `cell_updated` publishes (~10 Hz at 30 TPS).
pub const CELL_UPDATE_EVERY: u64 = 3;
/// Ticks between bot director passes (~3 Hz).
pub const BOT_TICK_EVERY: u64 = 10;

/// Display names longer than this are truncated on join.
pub const MAX_NAME_LENGTH: usize = 20;
