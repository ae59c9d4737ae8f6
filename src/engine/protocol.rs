//! Wire protocol for real-time connections
//!
//! Frames are JSON objects of the form `{"type": ..., "payload": ...}`.
//! Unknown tags or malformed payloads fail to decode and are handled as
//! validation errors by the dispatcher, never as a crash.

use serde::{Deserialize, Serialize};

use super::grid::Position;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Enter a space. The token is the bearer credential issued at signin.
    #[serde(rename_all = "camelCase")]
    Join { space_id: String, token: String },
    /// Request a single-step move to an absolute cell.
    ///
    /// Clients may echo their own id here; the server binds identity to the
    /// connection and ignores it.
    #[serde(rename_all = "camelCase")]
    Movement {
        x: i64,
        y: i64,
        #[serde(default)]
        user_id: Option<String>,
    },
}

/// One occupant as seen in a join acknowledgment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantInfo {
    pub user_id: String,
    pub x: i64,
    pub y: i64,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Join acknowledgment to the joiner. `users` is everyone already in
    /// the room, not including the joiner.
    SpaceJoined {
        spawn: Position,
        users: Vec<OccupantInfo>,
    },
    /// A new occupant appeared, sent to everyone already in the room.
    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: String, x: i64, y: i64 },
    /// An occupant moved, sent to everyone else in the room.
    #[serde(rename_all = "camelCase")]
    Movement { user_id: String, x: i64, y: i64 },
    /// The sender's last movement was refused; payload carries the
    /// occupant's unchanged position so the client can resynchronize.
    MovementRejected { x: i64, y: i64 },
    /// An occupant left the room.
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: String },
    /// Protocol-level failure scoped to this connection.
    Error { message: String },
}
