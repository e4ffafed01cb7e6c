//! Community membership endpoints
//!
//! Adds or removes one company in one community. The company side accepts an
//! identifier or a name but must resolve to an existing company; the
//! community side accepts either and is created on add when nothing matches.

use crate::services::membership::{self, AddOutcome, ExpandedCommunity};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AddMembershipRequest {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMembershipParams {
    #[serde(default)]
    pub company_id: Option<String>,
    /// Company name, kept for backward compatibility
    #[serde(default)]
    pub company: Option<String>,
}

fn validate_community(identifier: &str) -> ApiResult<&str> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() || trimmed == "undefined" {
        return Err(ApiError::BadRequest(
            "Invalid community identifier".to_string(),
        ));
    }
    Ok(trimmed)
}

fn company_reference(id: Option<&str>, name: Option<&str>) -> ApiResult<String> {
    id.or(name)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("Company ID or name is required".to_string()))
}

/// POST /api/communities/:community/companies
async fn add(
    State(state): State<AppState>,
    Path(community): Path<String>,
    Json(payload): Json<AddMembershipRequest>,
) -> ApiResult<Json<ExpandedCommunity>> {
    let community_ref = validate_community(&community)?;
    let company_ref = company_reference(
        payload.company_id.as_deref(),
        payload.company_name.as_deref(),
    )?;

    match membership::add_company(&state.db, &company_ref, community_ref).await? {
        AddOutcome::Added(expanded) => {
            info!(company = %company_ref, community = %expanded.name, "Added company to community");
            Ok(Json(expanded))
        }
        AddOutcome::AlreadyMember(expanded) => Err(ApiError::ConflictWith(
            "Company is already in this community".to_string(),
            json!({ "community": expanded }),
        )),
    }
}

/// DELETE /api/communities/:community/companies?company_id=<guid>
/// (or ?company=<name>)
async fn remove(
    State(state): State<AppState>,
    Path(community): Path<String>,
    Query(params): Query<RemoveMembershipParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let community_ref = validate_community(&community)?;
    let company_ref =
        company_reference(params.company_id.as_deref(), params.company.as_deref())?;

    let expanded = membership::remove_company(&state.db, &company_ref, community_ref).await?;
    info!(company = %company_ref, community = %expanded.name, "Removed company from community");

    Ok(Json(json!({
        "message": "Company removed from community successfully",
        "community": expanded,
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/communities/:community/companies",
        post(add).delete(remove),
    )
}
