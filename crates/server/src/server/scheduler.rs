//! Fixed-rate tick scheduler and broadcaster.
//!
//! Exactly one scheduler task drives the world: it drains queued commands,
//! advances the simulation, runs the bot director, and fans the resulting
//! events (or a periodic snapshot) out to every session. This task is the
//! serialization point that defines the game's timeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use protocol::{ClientMessage, Event, EventPayload, InitData, ServerMessage, WorldSize};

use crate::ai::BotDirector;
use crate::constants::{
    BOT_TICK_EVERY, MAX_NAME_LENGTH, TICK_DT, WORLD_HEIGHT, WORLD_WIDTH,
};
use crate::events::EventBus;
use crate::world::World;

use super::session::{SessionHandle, SessionRegistry};

/// Capacity of the command queue shared by every session.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;
/// Every viewer gets a full snapshot at least this often.
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(10);

/// A player intent, translated from the wire by the session endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join { name: String },
    Move { x: f64, y: f64 },
    Split,
    Eject,
}

impl From<ClientMessage> for Command {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Join { name } => Command::Join { name },
            ClientMessage::Move { x, y } => Command::Move { x, y },
            ClientMessage::Split => Command::Split,
            ClientMessage::Eject => Command::Eject,
        }
    }
}

/// A command tagged with the session that issued it.
#[derive(Debug)]
pub struct SessionCommand {
    pub session_id: Uuid,
    pub command: Command,
}

pub struct Scheduler {
    world: Arc<RwLock<World>>,
    bots: Arc<RwLock<BotDirector>>,
    sessions: SessionRegistry,
    commands_rx: mpsc::Receiver<SessionCommand>,
    register_rx: mpsc::Receiver<(Uuid, SessionHandle)>,
    unregister_rx: mpsc::Receiver<Uuid>,
    /// Loops back to the unregister queue for sessions found dead while
    /// broadcasting.
    unregister_tx: mpsc::Sender<Uuid>,
    last_snapshot_at: Instant,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        world: Arc<RwLock<World>>,
        bots: Arc<RwLock<BotDirector>>,
        sessions: SessionRegistry,
        commands_rx: mpsc::Receiver<SessionCommand>,
        register_rx: mpsc::Receiver<(Uuid, SessionHandle)>,
        unregister_rx: mpsc::Receiver<Uuid>,
        unregister_tx: mpsc::Sender<Uuid>,
    ) -> Self {
        Self {
            world,
            bots,
            sessions,
            commands_rx,
            register_rx,
            unregister_rx,
            unregister_tx,
            last_snapshot_at: Instant::now(),
        }
    }

    /// Drive the world until the process dies.
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs_f64(TICK_DT));
        // Skip missed ticks instead of bursting to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some((id, handle)) = self.register_rx.recv() => {
                    self.sessions.write().await.insert(id, handle);
                    debug!("session {id} registered");
                }
                Some(id) = self.unregister_rx.recv() => {
                    self.unregister(id).await;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn unregister(&mut self, session_id: Uuid) {
        let handle = self.sessions.write().await.remove(&session_id);
        let Some(handle) = handle else { return };
        if let Some(player_id) = handle.player_id {
            self.world.write().await.remove_player(player_id);
            info!("session {session_id} unregistered, player {player_id} removed");
        } else {
            debug!("session {session_id} unregistered");
        }
    }

    /// One tick edge: commands, simulation, bots, then snapshot or deltas.
    async fn tick(&mut self) {
        let mut world = self.world.write().await;

        while let Ok(command) = self.commands_rx.try_recv() {
            self.apply_command(&mut world, command).await;
        }

        world.step(TICK_DT);

        if world.tick_count() % BOT_TICK_EVERY == 0 {
            self.bots.write().await.tick(&mut world);
        }

        let batch = world.events().flush();

        if self.last_snapshot_at.elapsed() >= SNAPSHOT_INTERVAL {
            // The snapshot supersedes this tick's deltas.
            let snapshot = Event::now(EventPayload::WorldSnapshot(world.snapshot()));
            drop(world);
            self.last_snapshot_at = Instant::now();
            match serde_json::to_string(&snapshot) {
                Ok(json) => self.broadcast(json).await,
                Err(e) => error!("snapshot serialization failed, skipping broadcast: {e}"),
            }
        } else if !batch.is_empty() {
            drop(world);
            match EventBus::serialize_batch(&batch) {
                Ok(json) => self.broadcast(json).await,
                Err(e) => error!("event batch serialization failed, skipping broadcast: {e}"),
            }
        }
    }

    /// Apply one queued command. Commands from unknown sessions, or non-join
    /// commands from sessions that never joined, are silently dropped.
    async fn apply_command(&self, world: &mut World, command: SessionCommand) {
        let SessionCommand { session_id, command } = command;
        match command {
            Command::Join { name } => {
                let mut sessions = self.sessions.write().await;
                let Some(handle) = sessions.get_mut(&session_id) else { return };
                if handle.player_id.is_some() {
                    return;
                }

                let display_name: String = if name.trim().is_empty() {
                    "Unnamed".to_string()
                } else {
                    name.chars().take(MAX_NAME_LENGTH).collect()
                };
                let color = world.random_player_color();
                let player_id = world.add_player(&display_name, color, false);
                handle.player_id = Some(player_id);

                let init = ServerMessage::Init(InitData {
                    player_id,
                    world_size: WorldSize { width: WORLD_WIDTH, height: WORLD_HEIGHT },
                });
                match serde_json::to_string(&init) {
                    Ok(json) => {
                        let _ = handle.outbound.try_send(json);
                    }
                    Err(e) => error!("init serialization failed: {e}"),
                }
                info!("session {session_id} joined as {display_name:?} (player {player_id})");
            }
            Command::Move { x, y } => {
                if let Some(player_id) = self.bound_player(session_id).await {
                    world.set_target(player_id, x, y);
                }
            }
            Command::Split => {
                if let Some(player_id) = self.bound_player(session_id).await {
                    world.split(player_id);
                }
            }
            Command::Eject => {
                if let Some(player_id) = self.bound_player(session_id).await {
                    world.eject(player_id);
                }
            }
        }
    }

    async fn bound_player(&self, session_id: Uuid) -> Option<Uuid> {
        self.sessions.read().await.get(&session_id)?.player_id
    }

    /// Fan a serialized frame out to every session without blocking the
    /// tick. A session whose buffer is full is dead by policy.
    async fn broadcast(&self, json: String) {
        let mut dead = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (&id, handle) in sessions.iter() {
                if handle.outbound.try_send(json.clone()).is_err() {
                    dead.push(id);
                }
            }
        }
        for id in dead {
            warn!("session {id} send buffer full or closed, scheduling unregister");
            let _ = self.unregister_tx.try_send(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::session::SEND_BUFFER_CAPACITY;
    use std::collections::HashMap;

    struct Harness {
        scheduler: Scheduler,
        commands_tx: mpsc::Sender<SessionCommand>,
        unregister_rx_probe: Option<mpsc::Receiver<Uuid>>,
    }

    fn harness() -> Harness {
        let world = Arc::new(RwLock::new(World::with_seed(42)));
        let bots = Arc::new(RwLock::new(BotDirector::new(0)));
        let sessions: SessionRegistry = Arc::new(RwLock::new(HashMap::new()));
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (_register_tx, register_rx) = mpsc::channel(16);
        let (unregister_tx, unregister_rx) = mpsc::channel(64);
        let scheduler = Scheduler::new(
            world,
            bots,
            sessions,
            commands_rx,
            register_rx,
            unregister_rx,
            unregister_tx,
        );
        Harness {
            commands_tx,
            unregister_rx_probe: None,
            scheduler,
        }
    }

    async fn add_session(scheduler: &Scheduler, capacity: usize) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(capacity);
        scheduler
            .sessions
            .write()
            .await
            .insert(id, SessionHandle { outbound: tx, player_id: None });
        (id, rx)
    }

    #[tokio::test]
    async fn join_binds_session_and_replies_init() {
        let mut h = harness();
        let (session_id, mut rx) = add_session(&h.scheduler, SEND_BUFFER_CAPACITY).await;

        h.commands_tx
            .send(SessionCommand { session_id, command: Command::Join { name: "alice".into() } })
            .await
            .unwrap();
        h.scheduler.tick().await;

        let bound = h.scheduler.sessions.read().await[&session_id].player_id;
        let player_id = bound.expect("join must bind a player");
        assert!(h.scheduler.world.read().await.player(player_id).is_some());

        let init = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&init).unwrap();
        assert_eq!(value["type"], "init");
        assert_eq!(value["data"]["playerId"], player_id.to_string());
        assert_eq!(value["data"]["worldSize"]["width"], WORLD_WIDTH);
    }

    #[tokio::test]
    async fn commands_from_unjoined_sessions_are_dropped() {
        let mut h = harness();
        let (session_id, _rx) = add_session(&h.scheduler, SEND_BUFFER_CAPACITY).await;

        h.commands_tx
            .send(SessionCommand { session_id, command: Command::Move { x: 1.0, y: 2.0 } })
            .await
            .unwrap();
        h.commands_tx
            .send(SessionCommand { session_id: Uuid::new_v4(), command: Command::Split })
            .await
            .unwrap();
        h.scheduler.tick().await;

        // Nothing joined, nothing crashed, no player appeared.
        assert!(h.scheduler.world.read().await.players.is_empty());
    }

    #[tokio::test]
    async fn full_send_buffer_marks_session_dead() {
        let mut h = harness();
        let probe = std::mem::replace(&mut h.scheduler.unregister_rx, mpsc::channel(1).1);
        h.unregister_rx_probe = Some(probe);

        let (healthy_id, mut healthy_rx) = add_session(&h.scheduler, SEND_BUFFER_CAPACITY).await;
        let (stuck_id, _stuck_rx) = add_session(&h.scheduler, 1).await;
        // Jam the stuck session's buffer.
        h.scheduler.sessions.read().await[&stuck_id]
            .outbound
            .try_send("jam".to_string())
            .unwrap();

        h.scheduler.broadcast("{\"type\":\"event_batch\",\"events\":[]}".to_string()).await;

        assert_eq!(healthy_rx.recv().await.unwrap(), "{\"type\":\"event_batch\",\"events\":[]}");
        let dead = h.unregister_rx_probe.as_mut().unwrap().try_recv().unwrap();
        assert_eq!(dead, stuck_id);
        assert_ne!(dead, healthy_id);
    }

    #[tokio::test]
    async fn snapshot_interval_forces_world_snapshot() {
        let mut h = harness();
        let (_session_id, mut rx) = add_session(&h.scheduler, SEND_BUFFER_CAPACITY).await;
        h.scheduler.last_snapshot_at = Instant::now() - Duration::from_secs(11);

        h.scheduler.tick().await;

        let frame = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "world_snapshot");
        assert!(value["data"]["food"].as_array().unwrap().len() <= 3000);
        // The snapshot timer reset: the next tick goes back to deltas.
        assert!(h.scheduler.last_snapshot_at.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn quiet_tick_sends_nothing() {
        let mut h = harness();
        let (_session_id, mut rx) = add_session(&h.scheduler, SEND_BUFFER_CAPACITY).await;

        // Flush join/refill noise, then run a tick with no events.
        h.scheduler.world.write().await.events().flush();
        h.scheduler.tick().await;
        // tick 1: no cell updates (no players), food already full, no events.
        assert!(rx.try_recv().is_err());
    }
}
