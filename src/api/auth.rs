//! Authentication API endpoints

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::auth::Role;

/// Build auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/signup", post(signup))
        .route("/api/v1/signin", post(signin))
}

/// Signup request
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "type")]
    pub account_type: String,
}

/// Signup response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: String,
}

/// Register a new account
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let role: Role = req
        .account_type
        .parse()
        .map_err(|()| ApiError::BadRequest(format!("unknown account type: {}", req.account_type)))?;

    let account = state.accounts.signup(&req.username, &req.password, role).await?;
    Ok(Json(SignupResponse {
        user_id: account.id,
    }))
}

/// Signin request
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Signin response
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
}

/// Login with username and password
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let (_, token) = state.accounts.signin(&req.username, &req.password).await?;
    Ok(Json(SigninResponse { token }))
}
