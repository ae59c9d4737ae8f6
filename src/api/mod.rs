//! HTTP API module - REST endpoints and WebSocket

mod admin;
mod auth;
mod space;
mod user;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::accounts::{Account, AccountService, AuthError};
use crate::auth::Role;
use crate::catalog::{CatalogError, CatalogService};
use crate::db::Database;
use crate::engine::RoomRegistry;
use crate::space::{SpaceError, SpaceService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub spaces: Arc<SpaceService>,
    pub rooms: Arc<RoomRegistry>,
}

/// Build the API router
pub fn router(db: Arc<Database>) -> Router {
    let accounts = Arc::new(AccountService::new(db.pool().clone()));
    let catalog = Arc::new(CatalogService::new(db.pool().clone()));
    let spaces = Arc::new(SpaceService::new(db.pool().clone()));
    let rooms = Arc::new(RoomRegistry::new());

    let state = AppState {
        db,
        accounts,
        catalog,
        spaces,
        rooms,
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .merge(auth::router())
        .merge(admin::router())
        .merge(user::router())
        .merge(space::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error surface for REST handlers, mapped onto the status semantics the
/// clients rely on: authorization failures are 403, lookup and validation
/// failures 400, duplicate signups 409.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid authorization")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(String),
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UsernameExists => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized,
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::UnknownAvatar => ApiError::BadRequest(err.to_string()),
            AuthError::Database(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound => ApiError::BadRequest(err.to_string()),
            CatalogError::Validation(msg) => ApiError::BadRequest(msg),
            CatalogError::Database(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SpaceError> for ApiError {
    fn from(err: SpaceError) -> Self {
        match err {
            SpaceError::Forbidden => ApiError::Forbidden,
            SpaceError::NotFound
            | SpaceError::OutOfBounds
            | SpaceError::UnknownElement => ApiError::BadRequest(err.to_string()),
            SpaceError::Validation(msg) => ApiError::BadRequest(msg),
            SpaceError::Database(err) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Resolve the bearer token in the Authorization header to an account.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Account, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    match state.accounts.validate_token(token).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

/// Resolve and require an admin account.
pub async fn authenticate_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Account, ApiError> {
    let account = authenticate(state, headers).await?;
    if account.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(account)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "plazad",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
