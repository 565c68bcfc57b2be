//! Food pellets.

use uuid::Uuid;

use crate::constants::{FOOD_GRACE, FOOD_RADIUS};
use crate::geometry::Vec2;

/// A pellet that can be absorbed by a cell.
#[derive(Debug, Clone)]
pub struct Food {
    pub id: Uuid,
    pub position: Vec2,
    pub color: String,
    pub radius: f64,
    /// Mass granted to whoever eats it.
    pub mass: f64,
    /// Nonzero only for ejected food, decaying under friction.
    pub velocity: Vec2,
    /// World-clock seconds at creation; guards the eat grace window.
    pub spawned_at: f64,
}

impl Food {
    /// Natural food, spawned by world replenishment.
    pub fn new(position: Vec2, color: String, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            color,
            radius: FOOD_RADIUS,
            mass: 1.0,
            velocity: Vec2::ZERO,
            spawned_at: now,
        }
    }

    /// Food ejected by a player: heavier, larger and moving.
    pub fn ejected(position: Vec2, color: String, mass: f64, velocity: Vec2, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            color,
            radius: FOOD_RADIUS * mass.sqrt(),
            mass,
            velocity,
            spawned_at: now,
        }
    }

    /// Whether the grace window has elapsed and the pellet may be eaten.
    pub fn edible(&self, now: f64) -> bool {
        now - self.spawned_at >= FOOD_GRACE
    }
}
