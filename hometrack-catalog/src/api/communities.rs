//! Community endpoints
//!
//! The list endpoint serves the unified view: persisted communities merged
//! with communities implied by plan records.

use crate::db::communities::{self, Community};
use crate::services::community_view::{self, UnifiedCommunity};
use crate::services::membership::{expand_community, ExpandedCommunity};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommunityParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub all: Option<String>,
}

/// GET /api/communities
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<UnifiedCommunity>>> {
    let view = community_view::unified_communities(&state.db).await?;
    Ok(Json(view))
}

/// POST /api/communities
async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<ExpandedCommunity>)> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Community name is required".to_string()))?;

    if communities::find_by_name_exact(&state.db, name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Community already exists".to_string()));
    }

    let mut community = Community::new(name.to_string());
    community.description = payload.description;
    community.location = payload.location;

    match communities::insert_community(&state.db, &community).await {
        Ok(()) => {}
        Err(hometrack_common::Error::Database(ref e)) if crate::db::is_unique_violation(e) => {
            return Err(ApiError::Conflict("Community already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(community = %community.name, "Created community");
    let expanded = expand_community(&state.db, &community).await?;
    Ok((StatusCode::CREATED, Json(expanded)))
}

/// DELETE /api/communities?id=<guid> or /api/communities?all=true
async fn delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteCommunityParams>,
) -> ApiResult<Json<serde_json::Value>> {
    if params.all.as_deref() == Some("true") {
        let deleted_count = communities::delete_all_communities(&state.db).await?;
        info!(deleted_count, "Deleted all communities");
        let noun = if deleted_count == 1 {
            "community"
        } else {
            "communities"
        };
        return Ok(Json(json!({
            "message": format!("Successfully deleted {deleted_count} {noun}"),
            "deleted_count": deleted_count,
        })));
    }

    let id = params
        .id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Community ID is required".to_string()))?;
    let guid = Uuid::parse_str(id)
        .map_err(|_| ApiError::BadRequest("Invalid community ID".to_string()))?;

    let deleted = communities::delete_community(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    info!(community = %deleted.name, "Deleted community");
    let expanded = expand_community(&state.db, &deleted).await?;
    Ok(Json(json!({
        "message": "Community deleted successfully",
        "community": expanded,
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/communities", get(list).post(create).delete(delete))
}
