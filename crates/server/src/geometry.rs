//! 2D geometry primitives.
//!
//! Positions, velocities and targets are `glam::DVec2` values; the helpers
//! here pin down the conventions the simulation relies on.

use glam::DVec2;

/// 2D vector used for positions, velocities and targets.
pub type Vec2 = DVec2;

/// Unit vector from `from` toward `to`; zero when the points coincide.
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    a.distance(b)
}
