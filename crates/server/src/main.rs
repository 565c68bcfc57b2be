//! Mitosis game server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod ai;
mod config;
mod constants;
mod entity;
mod events;
mod geometry;
mod server;
mod world;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Mitosis Server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  Bots: {}", config.bots.count);
    info!(
        "  Admin: {}",
        if config.admin.enabled { format!("port {}", config.admin.port) } else { "disabled".to_string() }
    );

    server::run(config).await
}
