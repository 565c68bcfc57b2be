//! Administrative HTTP surface.
//!
//! A side channel for operators: live counts, bot population control,
//! kick-by-id, and food spawning. No game invariant depends on it; every
//! handler takes the shared locks briefly and gets out of the way.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::ai::BotDirector;
use crate::config::AdminConfig;
use crate::constants::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::world::World;

use super::session::SessionRegistry;

#[derive(Clone)]
struct AdminState {
    world: Arc<RwLock<World>>,
    bots: Arc<RwLock<BotDirector>>,
    sessions: SessionRegistry,
    started_at: Instant,
}

#[derive(Deserialize)]
struct CountQuery {
    count: Option<usize>,
}

pub async fn run(
    config: AdminConfig,
    world: Arc<RwLock<World>>,
    bots: Arc<RwLock<BotDirector>>,
    sessions: SessionRegistry,
) -> anyhow::Result<()> {
    let state = AdminState { world, bots, sessions, started_at: Instant::now() };

    let app = Router::new()
        .route("/api/stats", get(stats))
        .route("/api/bots/add", post(add_bots))
        .route("/api/bots/remove", post(remove_bots))
        .route("/api/player/kick/{id}", post(kick_player))
        .route("/api/food/spawn", post(spawn_food))
        .with_state(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("admin surface on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn stats(State(state): State<AdminState>) -> Json<Value> {
    let world = state.world.read().await;
    let mut humans = 0usize;
    let mut bots = 0usize;
    let mut cells = 0usize;
    let mut total_mass = 0.0;
    for player in world.players.values() {
        if player.is_bot {
            bots += 1;
        } else {
            humans += 1;
        }
        cells += player.cells.len();
        total_mass += player.total_mass();
    }
    let food = world.food.len();
    drop(world);
    let connections = state.sessions.read().await.len();

    Json(json!({
        "players": humans,
        "bots": bots,
        "food": food,
        "cells": cells,
        "totalMass": total_mass as i64,
        "worldSize": { "width": WORLD_WIDTH, "height": WORLD_HEIGHT },
        "connections": connections,
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}

async fn add_bots(State(state): State<AdminState>, Query(q): Query<CountQuery>) -> Json<Value> {
    let count = q.count.unwrap_or(5);
    let mut world = state.world.write().await;
    let mut bots = state.bots.write().await;
    bots.add_bots(&mut world, count);
    info!("admin added {count} bots (total {})", bots.bot_count());
    Json(json!({ "success": true, "added": count, "total": bots.bot_count() }))
}

async fn remove_bots(State(state): State<AdminState>, Query(q): Query<CountQuery>) -> Json<Value> {
    let count = q.count.unwrap_or(5);
    let mut world = state.world.write().await;
    let mut bots = state.bots.write().await;
    let removed = bots.remove_bots(&mut world, count);
    info!("admin removed {removed} bots (total {})", bots.bot_count());
    Json(json!({ "success": true, "removed": removed, "total": bots.bot_count() }))
}

async fn kick_player(State(state): State<AdminState>, Path(id): Path<Uuid>) -> Json<Value> {
    state.world.write().await.remove_player(id);
    info!("admin kicked player {id}");
    Json(json!({ "success": true }))
}

async fn spawn_food(State(state): State<AdminState>, Query(q): Query<CountQuery>) -> Json<Value> {
    let count = q.count.unwrap_or(100);
    let spawned = state.world.write().await.spawn_food(count);
    Json(json!({ "success": true, "spawned": spawned }))
}
