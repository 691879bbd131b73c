//! WebSocket game server for two-player chess.
//!
//! Accepts WebSocket connections from the browser clients, tracks lobbies
//! and running games, and routes tagged JSON frames between the two players
//! of each game.

mod codes;
mod config;
mod games;
mod hub;
mod lobby;
mod protocol;

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use config::Config;
use hub::{Hub, HubError};
use lobby::PlayerId;
use protocol::{ClientRequest, ServerMessage};

static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::load().await?;
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("chess server listening on ws://{}", addr);

    let hub = Arc::new(Hub::new());

    while let Ok((stream, peer)) = listener.accept().await {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, hub).await {
                tracing::warn!(%peer, "connection error: {}", e);
            }
        });
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Arc<Hub>,
) -> Result<(), HubError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let player: PlayerId = NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed);
    tracing::info!(player, %peer, "connection opened");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ServerMessage>();
    hub.register(player, tx);

    // outbound: hub messages -> socket
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("failed to encode frame: {}", e);
                    break;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // inbound: socket frames -> hub
    while let Some(frame) = ws_receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(player, "websocket error: {}", e);
                break;
            }
        };
        match serde_json::from_str::<ClientRequest>(&text) {
            Ok(request) => hub.handle(player, request),
            Err(e) => {
                let err = HubError::from(e);
                tracing::debug!(player, "ignoring malformed frame: {}", err);
            }
        }
    }

    hub.handle_disconnect(player);
    writer.abort();
    tracing::info!(player, "connection closed");
    Ok(())
}
