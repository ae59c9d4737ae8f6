//! Room registry - shared presence state for all live spaces
//!
//! The registry is the only place that holds cross-connection mutable
//! state. A room exists exactly while it has occupants: it is created on
//! the first join and torn down eagerly when the last occupant leaves.
//!
//! Locking: the registry map guards membership only and is never held
//! while a room's own mutex is taken, so operations on unrelated spaces
//! never serialize. A room marked `closed` is dead; joiners that raced
//! its teardown retry against a fresh entry. All fan-out is an enqueue
//! onto per-connection unbounded queues inside the room's critical
//! section, which gives every member the same per-room event order
//! without ever blocking on a socket.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::grid::{Position, SpatialGrid};
use super::protocol::{OccupantInfo, ServerMessage};

/// Outbound queue handle for one connection. Sends never block; the
/// connection's writer task drains the queue onto the socket.
pub type OutboundQueue = mpsc::UnboundedSender<ServerMessage>;

/// Why a join was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// Every cell is either static or already occupied.
    #[error("space has no free cell")]
    SpaceFull,
    /// The user already holds an occupant in this room.
    #[error("user already present in space")]
    AlreadyJoined,
}

/// Result of an accepted join.
#[derive(Debug)]
pub struct JoinOutcome {
    pub spawn: Position,
    /// Everyone who was in the room when the joiner was inserted.
    pub others: Vec<OccupantInfo>,
}

/// Result of a movement request.
#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted { position: Position },
    /// Refused; carries the occupant's unchanged position.
    Rejected { current: Position },
    /// Unknown space or user - a no-op, guards races with a concurrent leave.
    NotJoined,
}

struct Occupant {
    position: Position,
    outbound: OutboundQueue,
}

struct RoomState {
    /// Set when the room emptied and was unlinked from the registry.
    /// A handle to a closed room must not be used.
    closed: bool,
    occupants: HashMap<String, Occupant>,
}

struct Room {
    grid: SpatialGrid,
    state: Mutex<RoomState>,
}

impl Room {
    fn new(grid: SpatialGrid) -> Self {
        Self {
            grid,
            state: Mutex::new(RoomState {
                closed: false,
                occupants: HashMap::new(),
            }),
        }
    }
}

impl RoomState {
    /// Lowest (y, x) lexicographic free cell. Deterministic so tests can
    /// predict spawns.
    fn spawn_cell(&self, grid: &SpatialGrid) -> Option<Position> {
        for y in 0..i64::from(grid.height()) {
            for x in 0..i64::from(grid.width()) {
                let pos = Position::new(x, y);
                if grid.can_occupy(pos) && !self.cell_taken(pos) {
                    return Some(pos);
                }
            }
        }
        None
    }

    fn cell_taken(&self, pos: Position) -> bool {
        self.occupants.values().any(|o| o.position == pos)
    }

    /// Enqueue `msg` to every occupant except `exclude`. Dead queues are
    /// skipped; their occupant is removed when the connection's disconnect
    /// is processed.
    fn fan_out(&self, exclude: Option<&str>, msg: &ServerMessage) {
        for (user_id, occupant) in &self.occupants {
            if Some(user_id.as_str()) == exclude {
                continue;
            }
            if occupant.outbound.send(msg.clone()).is_err() {
                warn!("dropping broadcast to {}: connection gone", user_id);
            }
        }
    }
}

/// Registry of all rooms with live occupants, keyed by space id.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a user into a space, creating the room if absent.
    ///
    /// Atomically assigns a spawn cell, inserts the occupant, snapshots the
    /// other occupants, and enqueues the `space-joined` ack to the joiner
    /// and `user-joined` to everyone else. Enqueueing inside the critical
    /// section is what makes the snapshot and the fan-out consistent: no
    /// member can observe the join out of order.
    pub fn join(
        &self,
        space_id: &str,
        grid: SpatialGrid,
        user_id: &str,
        outbound: OutboundQueue,
    ) -> Result<JoinOutcome, JoinError> {
        loop {
            let room = {
                let mut rooms = self.rooms.lock();
                rooms
                    .entry(space_id.to_string())
                    .or_insert_with(|| Arc::new(Room::new(grid.clone())))
                    .clone()
            };

            let mut state = room.state.lock();
            if state.closed {
                // Raced a teardown; the entry has been replaced or removed.
                continue;
            }

            if state.occupants.contains_key(user_id) {
                return Err(JoinError::AlreadyJoined);
            }

            let Some(spawn) = state.spawn_cell(&room.grid) else {
                if state.occupants.is_empty() {
                    // The room was created just for this join; unlink it so
                    // room existence stays bijective with occupancy.
                    state.closed = true;
                    self.unlink(space_id, &room);
                }
                return Err(JoinError::SpaceFull);
            };

            let others: Vec<OccupantInfo> = state
                .occupants
                .iter()
                .map(|(id, o)| OccupantInfo {
                    user_id: id.clone(),
                    x: o.position.x,
                    y: o.position.y,
                })
                .collect();

            let ack = ServerMessage::SpaceJoined {
                spawn,
                users: others.clone(),
            };
            if outbound.send(ack).is_err() {
                warn!(space_id, user_id, "join ack dropped: connection gone");
            }

            state.occupants.insert(
                user_id.to_string(),
                Occupant {
                    position: spawn,
                    outbound,
                },
            );

            state.fan_out(
                Some(user_id),
                &ServerMessage::UserJoined {
                    user_id: user_id.to_string(),
                    x: spawn.x,
                    y: spawn.y,
                },
            );

            debug!(space_id, user_id, ?spawn, "occupant joined");
            return Ok(JoinOutcome { spawn, others });
        }
    }

    /// Validate and apply a single-step move.
    ///
    /// The check-and-set is atomic under the room lock: destination
    /// occupiable, exactly one orthogonal step from the current cell, and
    /// not claimed by another live occupant. Two racers for one cell can
    /// never both win.
    pub fn move_occupant(&self, space_id: &str, user_id: &str, target: Position) -> MoveOutcome {
        let Some(room) = self.room(space_id) else {
            return MoveOutcome::NotJoined;
        };

        let mut state = room.state.lock();
        if state.closed {
            return MoveOutcome::NotJoined;
        }

        let Some(current) = state.occupants.get(user_id).map(|o| o.position) else {
            return MoveOutcome::NotJoined;
        };

        let legal = room.grid.can_occupy(target)
            && current.is_adjacent_step(&target)
            && !state.cell_taken(target);
        if !legal {
            return MoveOutcome::Rejected { current };
        }

        if let Some(occupant) = state.occupants.get_mut(user_id) {
            occupant.position = target;
        }
        state.fan_out(
            Some(user_id),
            &ServerMessage::Movement {
                user_id: user_id.to_string(),
                x: target.x,
                y: target.y,
            },
        );

        MoveOutcome::Accepted { position: target }
    }

    /// Remove a user from a space and notify the remaining occupants.
    ///
    /// Unknown space or user is a no-op, so a leave raced by a disconnect
    /// (or issued twice) never double-broadcasts `user-left`. Returns the
    /// user ids still present.
    pub fn leave(&self, space_id: &str, user_id: &str) -> Vec<String> {
        let Some(room) = self.room(space_id) else {
            return Vec::new();
        };

        let mut state = room.state.lock();
        if state.closed {
            return Vec::new();
        }

        if state.occupants.remove(user_id).is_none() {
            return state.occupants.keys().cloned().collect();
        }

        if state.occupants.is_empty() {
            state.closed = true;
            self.unlink(space_id, &room);
            debug!(space_id, "room emptied and destroyed");
            return Vec::new();
        }

        state.fan_out(
            None,
            &ServerMessage::UserLeft {
                user_id: user_id.to_string(),
            },
        );
        state.occupants.keys().cloned().collect()
    }

    /// Deliver `message` to every occupant of a space except `exclude`.
    /// Unknown space is a no-op.
    pub fn broadcast(&self, space_id: &str, exclude: Option<&str>, message: ServerMessage) {
        if let Some(room) = self.room(space_id) {
            let state = room.state.lock();
            if !state.closed {
                state.fan_out(exclude, &message);
            }
        }
    }

    /// Number of rooms with live occupants.
    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Occupant count for a space, zero when the room does not exist.
    pub fn occupant_count(&self, space_id: &str) -> usize {
        self.room(space_id)
            .map(|room| room.state.lock().occupants.len())
            .unwrap_or(0)
    }

    fn room(&self, space_id: &str) -> Option<Arc<Room>> {
        self.rooms.lock().get(space_id).cloned()
    }

    /// Remove a specific room handle from the map. Compares identity so a
    /// replacement room for the same space id is never torn down by a
    /// stale handle.
    fn unlink(&self, space_id: &str, room: &Arc<Room>) {
        let mut rooms = self.rooms.lock();
        if let Some(current) = rooms.get(space_id) {
            if Arc::ptr_eq(current, room) {
                rooms.remove(space_id);
            }
        }
    }
}
