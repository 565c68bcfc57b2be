//! Player cells.

use uuid::Uuid;

use crate::constants::{
    BASE_SPEED, MAX_CELL_RADIUS, MERGE_COOLDOWN, MIN_CELL_RADIUS, SPEED_DECAY, SPLIT_COOLDOWN,
};
use crate::geometry::Vec2;

/// A single circular blob owned by exactly one player.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: Uuid,
    pub position: Vec2,
    pub radius: f64,
    /// Impulse from the last split; reported to clients for animation, not
    /// integrated by server movement.
    pub velocity: Vec2,
    /// World-clock seconds of the last split, for the split cooldown.
    pub last_split_at: f64,
    /// World-clock seconds of the last merge, for the merge cooldown.
    pub last_merge_at: f64,
}

impl Cell {
    pub fn new(position: Vec2, radius: f64, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            radius,
            velocity: Vec2::ZERO,
            last_split_at: now,
            last_merge_at: now,
        }
    }

    /// Mass derived from radius: `radius² / 100`.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.radius * self.radius / 100.0
    }

    /// Set mass by recomputing the radius, clamped to the legal range.
    #[inline]
    pub fn set_mass(&mut self, mass: f64) {
        self.radius = (mass * 100.0).sqrt().clamp(MIN_CELL_RADIUS, MAX_CELL_RADIUS);
    }

    /// Movement speed in units per second; heavier cells are slower.
    #[inline]
    pub fn speed(&self) -> f64 {
        BASE_SPEED / self.mass().powf(SPEED_DECAY)
    }

    pub fn can_split(&self, now: f64) -> bool {
        now - self.last_split_at >= SPLIT_COOLDOWN
    }

    pub fn can_merge(&self, now: f64) -> bool {
        now - self.last_merge_at >= MERGE_COOLDOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_radius_round_trip() {
        let mut cell = Cell::new(Vec2::ZERO, 20.0, 0.0);
        assert!((cell.mass() - 4.0).abs() < 1e-12);
        cell.set_mass(4.0);
        assert!((cell.radius - 20.0).abs() < 1e-9);
    }

    #[test]
    fn set_mass_clamps_radius() {
        let mut cell = Cell::new(Vec2::ZERO, 20.0, 0.0);
        cell.set_mass(0.0001);
        assert_eq!(cell.radius, MIN_CELL_RADIUS);
        cell.set_mass(1e9);
        assert_eq!(cell.radius, MAX_CELL_RADIUS);
    }

    #[test]
    fn heavier_cells_are_slower() {
        let mut light = Cell::new(Vec2::ZERO, 20.0, 0.0);
        let mut heavy = Cell::new(Vec2::ZERO, 20.0, 0.0);
        light.set_mass(10.0);
        heavy.set_mass(100.0);
        assert!(light.speed() > heavy.speed());
    }

    #[test]
    fn cooldowns() {
        let cell = Cell::new(Vec2::ZERO, 20.0, 10.0);
        assert!(!cell.can_split(10.3));
        assert!(cell.can_split(10.5));
        assert!(!cell.can_merge(24.9));
        assert!(cell.can_merge(25.0));
    }
}
