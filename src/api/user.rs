//! User-facing API endpoints - avatar metadata and catalog listings

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate, ApiError, AppState};

/// Build user router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/user/metadata", post(update_metadata))
        .route("/api/v1/user/metadata/bulk", get(metadata_bulk))
        .route("/api/v1/avatars", get(list_avatars))
        .route("/api/v1/elements", get(list_elements))
}

/// Metadata update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    pub avatar_id: String,
}

async fn update_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MetadataRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = authenticate(&state, &headers).await?;
    state.accounts.set_avatar(&account.id, &req.avatar_id).await?;
    Ok(Json(serde_json::json!({})))
}

/// Bulk metadata query, `ids=[id1,id2]`
#[derive(Debug, Deserialize)]
pub struct BulkQuery {
    pub ids: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAvatarResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub avatars: Vec<UserAvatarResponse>,
}

async fn metadata_bulk(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BulkQuery>,
) -> Result<Json<BulkResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let ids = parse_id_list(&query.ids);
    let avatars = state.accounts.avatars_for(&ids).await?;
    Ok(Json(BulkResponse {
        avatars: avatars
            .into_iter()
            .map(|a| UserAvatarResponse {
                user_id: a.user_id,
                avatar_id: a.avatar_id,
                image_url: a.image_url,
            })
            .collect(),
    }))
}

/// Parse the bracketed id list clients send, e.g. `[id1,id2]`. Quotes and
/// whitespace around entries are tolerated.
fn parse_id_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|part| part.trim().trim_matches('"').to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarsResponse {
    pub avatars: Vec<AvatarResponse>,
}

async fn list_avatars(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AvatarsResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let avatars = state.catalog.list_avatars().await?;
    Ok(Json(AvatarsResponse {
        avatars: avatars
            .into_iter()
            .map(|a| AvatarResponse {
                id: a.id,
                name: a.name,
                image_url: a.image_url,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResponse {
    pub id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Serialize)]
pub struct ElementsResponse {
    pub elements: Vec<ElementResponse>,
}

async fn list_elements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ElementsResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let elements = state.catalog.list_elements().await?;
    Ok(Json(ElementsResponse {
        elements: elements.into_iter().map(element_response).collect(),
    }))
}

pub(super) fn element_response(element: crate::catalog::Element) -> ElementResponse {
    ElementResponse {
        id: element.id,
        image_url: element.image_url,
        width: element.width,
        height: element.height,
        is_static: element.is_static,
    }
}
