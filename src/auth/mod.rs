//! Authentication module
//!
//! Salted password storage and opaque bearer tokens for the plazad server.
//! Tokens are rotated on every signin; the realtime engine validates them
//! through the [`crate::engine::CredentialVerifier`] boundary.

pub mod accounts;

use std::str::FromStr;

use rand::Rng;
use sha2::{Digest, Sha256};

/// Account role. Admins may manage the element/map/avatar catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// Random salt for password hashing, 128 bits hex-encoded.
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Salted password digest.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    hash_password(password, salt) == stored_hash
}

/// Opaque bearer token bound to an account. Mixing the account id into the
/// digest keeps tokens unique across accounts even on a weak RNG.
pub fn issue_token(account_id: &str) -> String {
    let bytes: [u8; 32] = rand::rng().random();
    let mut hasher = Sha256::new();
    hasher.update(account_id.as_bytes());
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
