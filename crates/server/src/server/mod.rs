//! Game server implementation: listener, sessions, scheduler, admin.

pub mod admin;
pub mod scheduler;
pub mod session;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::BotDirector;
use crate::config::Config;
use crate::world::World;

pub use scheduler::{Command, Scheduler, SessionCommand, COMMAND_QUEUE_CAPACITY};
pub use session::{SessionHandle, SessionRegistry};

/// Run the game server. Returns only on a fatal error; in particular, a
/// terminated scheduler means the authoritative timeline is compromised and
/// the process should be restarted by a supervisor.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let world = Arc::new(RwLock::new(World::new()));
    let bots = Arc::new(RwLock::new(BotDirector::new(config.bots.count)));
    let sessions: SessionRegistry = Arc::new(RwLock::new(HashMap::new()));

    // Initial bot population, before any viewer connects.
    {
        let mut world_guard = world.write().await;
        bots.write().await.spawn_to_target(&mut world_guard);
    }

    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (register_tx, register_rx) = mpsc::channel(16);
    let (unregister_tx, unregister_rx) = mpsc::channel(64);

    let scheduler = Scheduler::new(
        Arc::clone(&world),
        Arc::clone(&bots),
        Arc::clone(&sessions),
        commands_rx,
        register_rx,
        unregister_rx,
        unregister_tx.clone(),
    );
    let scheduler_task = tokio::spawn(scheduler.run());

    if config.admin.enabled {
        let admin_config = config.admin.clone();
        let admin_world = Arc::clone(&world);
        let admin_bots = Arc::clone(&bots);
        let admin_sessions = Arc::clone(&sessions);
        tokio::spawn(async move {
            if let Err(e) = admin::run(admin_config, admin_world, admin_bots, admin_sessions).await {
                warn!("admin surface failed: {e}");
            }
        });
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on ws://{addr}");

    tokio::select! {
        result = accept_loop(listener, commands_tx, register_tx, unregister_tx) => result,
        result = scheduler_task => match result {
            Ok(()) => Err(anyhow::anyhow!("tick scheduler exited")),
            Err(e) => Err(anyhow::anyhow!("tick scheduler panicked: {e}")),
        },
    }
}

/// Accept connections forever, spawning a session handler per socket.
async fn accept_loop(
    listener: TcpListener,
    commands_tx: mpsc::Sender<SessionCommand>,
    register_tx: mpsc::Sender<(Uuid, SessionHandle)>,
    unregister_tx: mpsc::Sender<Uuid>,
) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let commands_tx = commands_tx.clone();
        let register_tx = register_tx.clone();
        let unregister_tx = unregister_tx.clone();
        tokio::spawn(async move {
            if let Err(e) =
                session::handle_connection(stream, peer, commands_tx, register_tx, unregister_tx)
                    .await
            {
                warn!("connection error from {peer}: {e}");
            }
        });
    }
}
