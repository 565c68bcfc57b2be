//! Server configuration.
//!
//! Runtime-tunable settings only. Gameplay constants live in `constants.rs`
//! and are part of the client contract.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bots: BotConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("no config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            bots: BotConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Game listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), port: default_port() }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8090
}

/// Bot population settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Target number of bots kept alive by the director.
    #[serde(default = "default_bot_count")]
    pub count: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self { count: default_bot_count() }
    }
}

fn default_bot_count() -> usize {
    5
}

/// Admin HTTP surface settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { enabled: default_admin_enabled(), bind: default_bind(), port: default_admin_port() }
    }
}

fn default_admin_enabled() -> bool {
    true
}
fn default_admin_port() -> u16 {
    8091
}
