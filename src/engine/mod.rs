//! Real-time presence and movement engine
//!
//! Tracks which users occupy which space, validates single-step grid
//! movement, and fans state changes out to the right connections with a
//! deterministic per-room order. The engine consumes identity and space
//! metadata only through the collaborator traits below; the HTTP services
//! implement them, and tests substitute fixtures.

pub mod grid;
pub mod protocol;
pub mod registry;
pub mod session;

use async_trait::async_trait;
use thiserror::Error;

pub use grid::{Position, SpaceMetadata, SpatialGrid};
pub use protocol::{ClientMessage, OccupantInfo, ServerMessage};
pub use registry::{JoinError, JoinOutcome, MoveOutcome, OutboundQueue, RoomRegistry};
pub use session::{Flow, Session};

/// Identity resolved from a bearer credential at join time.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub user_id: String,
}

/// A credential failed to resolve to a user.
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("invalid or expired credential")]
    Invalid,
    #[error("credential backend unavailable: {0}")]
    Unavailable(String),
}

/// A space id failed to resolve to metadata.
#[derive(Debug, Error)]
pub enum SpaceLookupError {
    #[error("space not found")]
    NotFound,
    #[error("space backend unavailable: {0}")]
    Unavailable(String),
}

/// Resolves join credentials to user identities.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedUser, AuthRejection>;
}

/// Resolves space ids to dimensions and static obstacle cells.
#[async_trait]
pub trait SpaceDirectory: Send + Sync {
    async fn resolve_space(&self, space_id: &str) -> Result<SpaceMetadata, SpaceLookupError>;
}
