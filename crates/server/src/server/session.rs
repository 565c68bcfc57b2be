//! Per-connection session endpoint.
//!
//! Each viewer gets a reader task that turns frames into commands and a
//! writer task that drains the bounded outbound buffer and keeps the
//! connection alive with pings. Neither touches world state directly.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, info};
use uuid::Uuid;

use protocol::ClientMessage;

use super::scheduler::{Command, SessionCommand};

/// Outbound messages buffered per session; a full buffer means the viewer
/// is too slow and the session is torn down rather than ever blocking the
/// tick.
pub const SEND_BUFFER_CAPACITY: usize = 16;
/// Reader gives up when nothing, not even a pong, arrives for this long.
const READ_DEADLINE: Duration = Duration::from_secs(30);
/// Keepalive ping cadence.
const PING_INTERVAL: Duration = Duration::from_secs(10);
/// Writer gives up when a single frame takes this long to flush.
const WRITE_DEADLINE: Duration = Duration::from_secs(3);

/// Scheduler-side handle to a connected session.
#[derive(Debug)]
pub struct SessionHandle {
    pub outbound: mpsc::Sender<String>,
    /// Bound once the session joins; sessions reference players by id only.
    pub player_id: Option<Uuid>,
}

pub type SessionRegistry = Arc<RwLock<HashMap<Uuid, SessionHandle>>>;

/// Serve one WebSocket connection until either pump exits, then hand the
/// session back to the scheduler for removal.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    commands_tx: mpsc::Sender<SessionCommand>,
    register_tx: mpsc::Sender<(Uuid, SessionHandle)>,
    unregister_tx: mpsc::Sender<Uuid>,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let session_id = Uuid::new_v4();
    info!("session {session_id} connected from {peer}");

    let (write, read) = ws.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(SEND_BUFFER_CAPACITY);

    register_tx
        .send((session_id, SessionHandle { outbound: outbound_tx, player_id: None }))
        .await
        .map_err(|_| anyhow::anyhow!("scheduler is gone"))?;

    let mut writer = tokio::spawn(write_pump(write, outbound_rx, session_id));
    let mut reader = tokio::spawn(read_pump(read, session_id, commands_tx));

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    let _ = unregister_tx.send(session_id).await;
    info!("session {session_id} closed");
    Ok(())
}

/// Parse inbound frames into commands. Malformed frames are dropped and the
/// session lives on; read errors and deadline misses end the session.
async fn read_pump(
    mut read: SplitStream<WebSocketStream<TcpStream>>,
    session_id: Uuid,
    commands_tx: mpsc::Sender<SessionCommand>,
) {
    loop {
        let frame = match timeout(READ_DEADLINE, read.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                debug!("session {session_id} read error: {e}");
                return;
            }
            Ok(None) => return,
            Err(_) => {
                debug!("session {session_id} read deadline exceeded");
                return;
            }
        };

        match frame {
            Message::Text(text) => {
                let command = match ClientMessage::parse(text.as_str()) {
                    Ok(message) => Command::from(message),
                    Err(e) => {
                        debug!("session {session_id} dropped frame: {e}");
                        continue;
                    }
                };
                if commands_tx.send(SessionCommand { session_id, command }).await.is_err() {
                    return;
                }
            }
            Message::Close(_) => return,
            // Pings are answered by the websocket layer; pongs and any
            // other frame already refreshed the read deadline above.
            _ => {}
        }
    }
}

/// Drain the outbound buffer to the socket and ping on an interval.
async fn write_pump(
    mut write: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    session_id: Uuid,
) {
    let mut ping = interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = outbound_rx.recv() => {
                let Some(message) = message else {
                    // The registry dropped our handle; say goodbye.
                    let _ = write.send(Message::Close(None)).await;
                    return;
                };
                match timeout(WRITE_DEADLINE, write.send(Message::Text(message.into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!("session {session_id} write error: {e}");
                        return;
                    }
                    Err(_) => {
                        debug!("session {session_id} write deadline exceeded");
                        return;
                    }
                }
            }
            _ = ping.tick() => {
                let ping_frame = Message::Ping(Bytes::new());
                match timeout(WRITE_DEADLINE, write.send(ping_frame)).await {
                    Ok(Ok(())) => {}
                    _ => {
                        debug!("session {session_id} ping failed");
                        return;
                    }
                }
            }
        }
    }
}
