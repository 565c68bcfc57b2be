//! Authoritative server core for a cell-eating arena.

pub mod ai;
pub mod config;
pub mod constants;
pub mod entity;
pub mod events;
pub mod geometry;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use events::EventBus;
pub use world::World;
