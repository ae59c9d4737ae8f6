//! Per-connection protocol state machine
//!
//! Consumes decoded client messages plus the room registry and the
//! collaborator services, enforces the join/movement rules, and emits
//! server messages. Transport concerns stay in the dispatcher; this type
//! never touches a socket.
//!
//! States: `Unjoined -> Joined -> Closed`, with `Closed` terminal.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::grid::{Position, SpatialGrid};
use super::protocol::{ClientMessage, ServerMessage};
use super::registry::{JoinError, MoveOutcome, OutboundQueue, RoomRegistry};
use super::{CredentialVerifier, SpaceDirectory, SpaceLookupError};

/// What the dispatcher should do with the connection after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Terminate the connection after flushing pending outbound messages.
    Close,
}

enum SessionState {
    Unjoined,
    Joined { user_id: String, space_id: String },
    Closed,
}

/// Protocol state machine bound to one connection.
pub struct Session {
    connection_id: String,
    state: SessionState,
    outbound: OutboundQueue,
    rooms: Arc<RoomRegistry>,
    credentials: Arc<dyn CredentialVerifier>,
    spaces: Arc<dyn SpaceDirectory>,
}

impl Session {
    pub fn new(
        connection_id: String,
        outbound: OutboundQueue,
        rooms: Arc<RoomRegistry>,
        credentials: Arc<dyn CredentialVerifier>,
        spaces: Arc<dyn SpaceDirectory>,
    ) -> Self {
        Self {
            connection_id,
            state: SessionState::Unjoined,
            outbound,
            rooms,
            credentials,
            spaces,
        }
    }

    /// Enqueue a server message to this connection's writer. A dead queue
    /// means the connection is gone; the disconnect path settles the state.
    fn send(&self, msg: ServerMessage) {
        if self.outbound.send(msg).is_err() {
            warn!(
                connection_id = %self.connection_id,
                "dropping message: connection gone"
            );
        }
    }

    /// The authenticated user, once joined.
    pub fn user_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Joined { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Apply one decoded inbound message.
    pub async fn handle_message(&mut self, msg: ClientMessage) -> Flow {
        match msg {
            ClientMessage::Join { space_id, token } => self.handle_join(space_id, token).await,
            ClientMessage::Movement { x, y, user_id: _ } => self.handle_movement(x, y),
        }
    }

    async fn handle_join(&mut self, space_id: String, token: String) -> Flow {
        match self.state {
            SessionState::Unjoined => {}
            SessionState::Joined { .. } => {
                // One room per connection; a second join is a protocol
                // violation but not fatal.
                self.send(ServerMessage::Error {
                    message: "already joined a space".into(),
                });
                return Flow::Continue;
            }
            SessionState::Closed => return Flow::Close,
        }

        let user = match self.credentials.verify_token(&token).await {
            Ok(user) => user,
            Err(err) => {
                info!(
                    connection_id = %self.connection_id,
                    "join refused: {err}"
                );
                self.send(ServerMessage::Error {
                    message: "authentication failed".into(),
                });
                return Flow::Close;
            }
        };

        let meta = match self.spaces.resolve_space(&space_id).await {
            Ok(meta) => meta,
            Err(SpaceLookupError::NotFound) => {
                info!(
                    connection_id = %self.connection_id,
                    %space_id,
                    "join refused: unknown space"
                );
                self.send(ServerMessage::Error {
                    message: "space not found".into(),
                });
                return Flow::Close;
            }
            Err(err) => {
                warn!(%space_id, "space lookup failed: {err}");
                self.send(ServerMessage::Error {
                    message: "space lookup failed".into(),
                });
                return Flow::Close;
            }
        };

        let grid = SpatialGrid::new(meta);
        match self
            .rooms
            .join(&space_id, grid, &user.user_id, self.outbound.clone())
        {
            Ok(outcome) => {
                info!(
                    connection_id = %self.connection_id,
                    %space_id,
                    user_id = %user.user_id,
                    spawn = ?outcome.spawn,
                    occupants = outcome.others.len() + 1,
                    "joined space"
                );
                self.state = SessionState::Joined {
                    user_id: user.user_id,
                    space_id,
                };
                Flow::Continue
            }
            Err(err @ (JoinError::SpaceFull | JoinError::AlreadyJoined)) => {
                info!(
                    connection_id = %self.connection_id,
                    %space_id,
                    user_id = %user.user_id,
                    "join refused: {err}"
                );
                self.send(ServerMessage::Error {
                    message: err.to_string(),
                });
                Flow::Close
            }
        }
    }

    fn handle_movement(&mut self, x: i64, y: i64) -> Flow {
        let (user_id, space_id) = match &self.state {
            SessionState::Joined { user_id, space_id } => (user_id.clone(), space_id.clone()),
            SessionState::Unjoined => {
                self.send(ServerMessage::Error {
                    message: "join a space first".into(),
                });
                return Flow::Continue;
            }
            SessionState::Closed => return Flow::Close,
        };

        let target = Position::new(x, y);
        match self.rooms.move_occupant(&space_id, &user_id, target) {
            MoveOutcome::Accepted { position } => {
                debug!(%user_id, %space_id, ?position, "movement applied");
            }
            MoveOutcome::Rejected { current } => {
                // A legal outcome, not a fault: echo the unchanged position.
                self.send(ServerMessage::MovementRejected {
                    x: current.x,
                    y: current.y,
                });
            }
            MoveOutcome::NotJoined => {
                // The room vanished under us; only a racing teardown can do
                // that, and the disconnect path will settle the state.
                debug!(%user_id, %space_id, "movement ignored: room gone");
            }
        }
        Flow::Continue
    }

    /// Synthesized by the dispatcher on transport close or error. Safe to
    /// call more than once; only the first call leaves the room.
    pub fn handle_disconnect(&mut self) {
        if let SessionState::Joined { user_id, space_id } =
            std::mem::replace(&mut self.state, SessionState::Closed)
        {
            let remaining = self.rooms.leave(&space_id, &user_id);
            info!(
                connection_id = %self.connection_id,
                %space_id,
                %user_id,
                remaining = remaining.len(),
                "left space on disconnect"
            );
        }
    }
}
