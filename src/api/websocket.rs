//! WebSocket handler for real-time presence connections
//!
//! One task per connection. Inbound frames are decoded into the typed
//! client message set and fed to the session state machine; outbound
//! messages arrive on the connection's queue and are written to the
//! socket here. Transport close or error synthesizes the disconnect
//! transition exactly once.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::AppState;
use crate::engine::{ClientMessage, Flow, ServerMessage, Session};

/// Malformed frames tolerated before the connection is dropped.
const MAX_PROTOCOL_ERRORS: u32 = 8;

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = uuid::Uuid::new_v4().to_string();

    info!("WebSocket connected: {}", connection_id);

    let mut session = Session::new(
        connection_id.clone(),
        tx,
        state.rooms.clone(),
        state.accounts.clone(),
        state.spaces.clone(),
    );

    let mut protocol_errors = 0u32;

    loop {
        tokio::select! {
            // Drain our outbound queue onto the socket.
            Some(msg) = rx.recv() => {
                if write(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            // Decode and apply inbound frames.
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => {
                                if session.handle_message(msg).await == Flow::Close {
                                    flush(&mut socket, &mut rx).await;
                                    break;
                                }
                            }
                            Err(err) => {
                                debug!(%connection_id, "undecodable frame: {err}");
                                protocol_errors += 1;
                                let note = ServerMessage::Error {
                                    message: "unrecognized message".into(),
                                };
                                if write(&mut socket, &note).await.is_err()
                                    || protocol_errors >= MAX_PROTOCOL_ERRORS
                                {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Implicit immediate leave; the session guards against double-close.
    session.handle_disconnect();
    info!("WebSocket disconnected: {}", connection_id);
}

async fn write(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Best-effort delivery of queued messages before a server-initiated
/// close, so a refusal reaches the client ahead of the disconnect.
async fn flush(socket: &mut WebSocket, rx: &mut mpsc::UnboundedReceiver<ServerMessage>) {
    while let Ok(msg) = rx.try_recv() {
        if write(socket, &msg).await.is_err() {
            return;
        }
    }
}
