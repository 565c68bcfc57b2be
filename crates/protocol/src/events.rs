//! Event stream types.
//!
//! Every world change is published as an [`Event`] and shipped to clients in
//! `event_batch` frames. The periodic `world_snapshot` uses the same record
//! shape so clients handle both through one code path.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Event discriminator, used for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PlayerJoined,
    PlayerSplit,
    PlayerEjected,
    PlayerDied,
    CellUpdated,
    CellMerged,
    CellEaten,
    FoodSpawned,
    FoodEaten,
    WorldSnapshot,
}

/// A world change, tagged with the wall-clock time it was published.
///
/// Serializes as `{"type": ..., "data": ..., "timestamp": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Unix milliseconds at publish time.
    pub timestamp: i64,
}

impl Event {
    /// Wrap a payload with the current wall-clock timestamp.
    pub fn now(payload: EventPayload) -> Self {
        Self { payload, timestamp: unix_millis() }
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player_id: Uuid,
        name: String,
        color: String,
        is_bot: bool,
        cell_id: Uuid,
        x: f64,
        y: f64,
        radius: f64,
    },
    #[serde(rename_all = "camelCase")]
    PlayerSplit { player_id: Uuid, new_cells: Vec<CellInfo> },
    #[serde(rename_all = "camelCase")]
    PlayerEjected { player_id: Uuid, food: Vec<FoodInfo> },
    #[serde(rename_all = "camelCase")]
    PlayerDied { player_id: Uuid },
    #[serde(rename_all = "camelCase")]
    CellUpdated { cell_id: Uuid, player_id: Uuid, x: f64, y: f64, radius: f64 },
    #[serde(rename_all = "camelCase")]
    CellMerged {
        player_id: Uuid,
        cell1_id: Uuid,
        cell2_id: Uuid,
        new_cell_id: Uuid,
        x: f64,
        y: f64,
        radius: f64,
    },
    #[serde(rename_all = "camelCase")]
    CellEaten { eaten_cell_id: Uuid, eaten_by: Uuid, eater_cell_id: Uuid },
    FoodSpawned { foods: Vec<FoodInfo> },
    #[serde(rename_all = "camelCase")]
    FoodEaten { food_id: Uuid, player_id: Uuid, cell_id: Uuid },
    WorldSnapshot(WorldSnapshot),
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::PlayerJoined { .. } => EventType::PlayerJoined,
            EventPayload::PlayerSplit { .. } => EventType::PlayerSplit,
            EventPayload::PlayerEjected { .. } => EventType::PlayerEjected,
            EventPayload::PlayerDied { .. } => EventType::PlayerDied,
            EventPayload::CellUpdated { .. } => EventType::CellUpdated,
            EventPayload::CellMerged { .. } => EventType::CellMerged,
            EventPayload::CellEaten { .. } => EventType::CellEaten,
            EventPayload::FoodSpawned { .. } => EventType::FoodSpawned,
            EventPayload::FoodEaten { .. } => EventType::FoodEaten,
            EventPayload::WorldSnapshot(_) => EventType::WorldSnapshot,
        }
    }
}

/// A freshly created cell, as carried by `player_split`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellInfo {
    pub cell_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub vel_x: f64,
    pub vel_y: f64,
}

/// A food pellet, as carried by `food_spawned` and `player_ejected`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodInfo {
    pub food_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
    pub vel_x: f64,
    pub vel_y: f64,
}

/// Full authoritative state, broadcast for resync.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub timestamp: i64,
    pub players: Vec<PlayerState>,
    pub food: Vec<FoodState>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub is_bot: bool,
    pub score: i64,
    pub cells: Vec<CellState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellState {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodState {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

/// The `event_batch` frame: `{"type":"event_batch","events":[...]}`.
///
/// Events sit at the top level rather than under `data`; clients iterate
/// `message.events` directly.
#[derive(Debug, Serialize)]
pub struct EventBatch<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub events: &'a [Event],
}

impl<'a> EventBatch<'a> {
    pub fn new(events: &'a [Event]) -> Self {
        Self { kind: "event_batch", events }
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
