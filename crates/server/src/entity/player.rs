//! Player state.

use uuid::Uuid;

use super::Cell;
use crate::constants::START_RADIUS;
use crate::geometry::Vec2;

/// A controller, human or bot, owning up to `PLAYER_MAX_CELLS` cells that
/// share a single movement target.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    /// Hex color, e.g. `#FF6B6B`.
    pub color: String,
    pub is_bot: bool,
    pub cells: Vec<Cell>,
    /// World-space point every cell moves toward.
    pub target: Vec2,
    pub last_input_at: f64,
}

impl Player {
    /// Create a player with one starting cell at `start`.
    pub fn new(name: &str, color: String, is_bot: bool, start: Vec2, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color,
            is_bot,
            cells: vec![Cell::new(start, START_RADIUS, now)],
            target: start,
            last_input_at: now,
        }
    }

    /// A player is alive while it owns at least one cell.
    pub fn is_alive(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.cells.iter().map(Cell::mass).sum()
    }

    /// Leaderboard score.
    pub fn score(&self) -> i64 {
        self.total_mass().floor() as i64
    }

    /// Mean position of the owned cells; `None` once dead.
    pub fn center(&self) -> Option<Vec2> {
        if self.cells.is_empty() {
            return None;
        }
        let sum = self.cells.iter().fold(Vec2::ZERO, |acc, c| acc + c.position);
        Some(sum / self.cells.len() as f64)
    }
}
