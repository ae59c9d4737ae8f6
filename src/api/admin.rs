//! Admin API endpoints - element, avatar, and map catalog management

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate_admin, ApiError, AppState};
use crate::catalog::Placement;

/// Build admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/element", post(create_element))
        .route("/api/v1/admin/element/{id}", put(update_element))
        .route("/api/v1/admin/avatar", post(create_avatar))
        .route("/api/v1/admin/map", post(create_map))
}

/// Create-element request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElementRequest {
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "static")]
    pub is_static: bool,
}

/// Response carrying a created entity id
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

async fn create_element(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateElementRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    authenticate_admin(&state, &headers).await?;

    let element = state
        .catalog
        .create_element(&req.image_url, req.width, req.height, req.is_static)
        .await?;
    Ok(Json(IdResponse { id: element.id }))
}

/// Update-element request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElementRequest {
    pub image_url: String,
}

async fn update_element(
    State(state): State<AppState>,
    Path(element_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateElementRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate_admin(&state, &headers).await?;

    state
        .catalog
        .update_element_image(&element_id, &req.image_url)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// Create-avatar request. `name` is optional; some clients only send the
/// image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvatarRequest {
    pub image_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

async fn create_avatar(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAvatarRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    authenticate_admin(&state, &headers).await?;

    let avatar = state
        .catalog
        .create_avatar(req.name.as_deref().unwrap_or(""), &req.image_url)
        .await?;
    Ok(Json(IdResponse { id: avatar.id }))
}

/// Create-map request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMapRequest {
    pub thumbnail: String,
    pub dimensions: String,
    #[serde(default)]
    pub default_elements: Vec<MapPlacementRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPlacementRequest {
    pub element_id: String,
    pub x: i64,
    pub y: i64,
}

async fn create_map(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateMapRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    authenticate_admin(&state, &headers).await?;

    let dimensions = req.dimensions.parse()?;
    let placements: Vec<Placement> = req
        .default_elements
        .into_iter()
        .map(|p| Placement {
            element_id: p.element_id,
            x: p.x,
            y: p.y,
        })
        .collect();

    let map = state
        .catalog
        .create_map(&req.thumbnail, dimensions, &placements)
        .await?;
    Ok(Json(IdResponse { id: map.id }))
}
