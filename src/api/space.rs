//! Space API endpoints - creation, listing, and element placement

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::user::{element_response, ElementResponse};
use super::{authenticate, ApiError, AppState};

/// Build space router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/space", post(create_space))
        .route("/api/v1/space/all", get(list_spaces))
        .route(
            "/api/v1/space/element",
            post(add_element).delete(remove_element),
        )
        .route("/api/v1/space/{id}", get(get_space).delete(delete_space))
}

/// Create-space request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    pub name: String,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub map_id: Option<String>,
}

/// Create-space response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceResponse {
    pub space_id: String,
}

async fn create_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSpaceRequest>,
) -> Result<Json<CreateSpaceResponse>, ApiError> {
    let account = authenticate(&state, &headers).await?;

    let space = state
        .spaces
        .create_space(
            &account.id,
            &req.name,
            req.dimensions.as_deref(),
            req.map_id.as_deref(),
        )
        .await?;
    Ok(Json(CreateSpaceResponse { space_id: space.id }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceSummary {
    pub id: String,
    pub name: String,
    pub dimensions: String,
}

#[derive(Debug, Serialize)]
pub struct SpacesResponse {
    pub spaces: Vec<SpaceSummary>,
}

/// List the caller's spaces
async fn list_spaces(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SpacesResponse>, ApiError> {
    let account = authenticate(&state, &headers).await?;

    let spaces = state.spaces.list_for_owner(&account.id).await?;
    Ok(Json(SpacesResponse {
        spaces: spaces
            .into_iter()
            .map(|s| SpaceSummary {
                id: s.id,
                name: s.name,
                dimensions: s.dimensions.to_string(),
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct PlacedElementResponse {
    pub id: String,
    pub element: ElementResponse,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Serialize)]
pub struct SpaceViewResponse {
    pub dimensions: String,
    pub elements: Vec<PlacedElementResponse>,
}

/// The contents of one space
async fn get_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SpaceViewResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let space = state
        .spaces
        .get_space(&space_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("space not found".into()))?;
    let placed = state.spaces.placed_elements(&space_id).await?;

    Ok(Json(SpaceViewResponse {
        dimensions: space.dimensions.to_string(),
        elements: placed
            .into_iter()
            .map(|p| PlacedElementResponse {
                id: p.id,
                element: element_response(p.element),
                x: p.x,
                y: p.y,
            })
            .collect(),
    }))
}

async fn delete_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = authenticate(&state, &headers).await?;
    state.spaces.delete_space(&space_id, &account.id).await?;
    Ok(Json(serde_json::json!({})))
}

/// Add-element request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddElementRequest {
    pub space_id: String,
    pub element_id: String,
    pub x: i64,
    pub y: i64,
}

async fn add_element(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddElementRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate(&state, &headers).await?;

    let placed = state
        .spaces
        .add_element(&req.space_id, &req.element_id, req.x, req.y)
        .await?;
    Ok(Json(serde_json::json!({ "id": placed.id })))
}

/// Remove-element request, by placement id
#[derive(Debug, Deserialize)]
pub struct RemoveElementRequest {
    pub id: String,
}

async fn remove_element(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RemoveElementRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate(&state, &headers).await?;

    state.spaces.remove_element(&req.id).await?;
    Ok(Json(serde_json::json!({})))
}
