//! Account management service
//!
//! Signup, signin, token validation, and per-user avatar metadata.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use thiserror::Error;

use super::{generate_salt, hash_password, issue_token, verify_password, Role};
use crate::engine::{AuthRejection, CredentialVerifier, VerifiedUser};

/// Account data
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub avatar_id: Option<String>,
}

/// One user's avatar selection, as returned by the bulk metadata lookup.
#[derive(Debug, Clone)]
pub struct UserAvatar {
    pub user_id: String,
    pub avatar_id: Option<String>,
    pub image_url: Option<String>,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already exists")]
    UsernameExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("unknown avatar")]
    UnknownAvatar,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Account service for authentication operations
pub struct AccountService {
    pool: SqlitePool,
}

impl AccountService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account with the given role.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(AuthError::UsernameExists);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let salt = generate_salt();
        let password_hash = hash_password(password, &salt);
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, salt, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(&password_hash)
        .bind(&salt)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id,
            username: username.to_string(),
            role,
            avatar_id: None,
        })
    }

    /// Authenticate with username and password; rotates and returns the
    /// account's bearer token.
    pub async fn signin(&self, username: &str, password: &str) -> Result<(Account, String), AuthError> {
        let row: Option<(String, String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, password_hash, salt, role, avatar_id FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let (id, stored_hash, salt, role, avatar_id) =
            row.ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &salt, &stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(&id);
        sqlx::query("UPDATE accounts SET token = ? WHERE id = ?")
            .bind(&token)
            .bind(&id)
            .execute(&self.pool)
            .await?;

        let account = Account {
            id,
            username: username.to_string(),
            role: role.parse().unwrap_or(Role::User),
            avatar_id,
        };
        Ok((account, token))
    }

    /// Validate a bearer token and return the associated account.
    pub async fn validate_token(&self, token: &str) -> Result<Option<Account>, AuthError> {
        if token.is_empty() {
            return Ok(None);
        }

        let row: Option<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, username, role, avatar_id FROM accounts WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, role, avatar_id)| Account {
            id,
            username,
            role: role.parse().unwrap_or(Role::User),
            avatar_id,
        }))
    }

    /// Set the account's avatar. The avatar must exist in the catalog.
    pub async fn set_avatar(&self, account_id: &str, avatar_id: &str) -> Result<(), AuthError> {
        let avatar: Option<(String,)> = sqlx::query_as("SELECT id FROM avatars WHERE id = ?")
            .bind(avatar_id)
            .fetch_optional(&self.pool)
            .await?;
        if avatar.is_none() {
            return Err(AuthError::UnknownAvatar);
        }

        sqlx::query("UPDATE accounts SET avatar_id = ? WHERE id = ?")
            .bind(avatar_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Avatar selections for a batch of user ids. Users without a chosen
    /// avatar are still reported, with empty fields.
    pub async fn avatars_for(&self, user_ids: &[String]) -> Result<Vec<UserAvatar>, AuthError> {
        let mut out = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT a.id, a.avatar_id, v.image_url
                 FROM accounts a LEFT JOIN avatars v ON v.id = a.avatar_id
                 WHERE a.id = ?",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some((user_id, avatar_id, image_url)) = row {
                out.push(UserAvatar {
                    user_id,
                    avatar_id,
                    image_url,
                });
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl CredentialVerifier for AccountService {
    async fn verify_token(&self, token: &str) -> Result<VerifiedUser, AuthRejection> {
        match self.validate_token(token).await {
            Ok(Some(account)) => Ok(VerifiedUser {
                user_id: account.id,
            }),
            Ok(None) => Err(AuthRejection::Invalid),
            Err(err) => Err(AuthRejection::Unavailable(err.to_string())),
        }
    }
}
