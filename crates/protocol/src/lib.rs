//! Shared wire protocol for the mitosis game server.
//!
//! This crate contains:
//! - The `{type, data}` JSON envelopes exchanged with clients
//! - Event types for the per-tick delta stream
//! - Snapshot records for periodic resync

mod error;
pub mod events;
pub mod messages;

pub use error::ProtocolError;
pub use events::{
    unix_millis, CellInfo, CellState, Event, EventBatch, EventPayload, EventType, FoodInfo,
    FoodState, PlayerState, WorldSnapshot,
};
pub use messages::{ClientMessage, InitData, ServerMessage, WorldSize};
