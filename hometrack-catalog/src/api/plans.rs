//! Plan endpoints
//!
//! Batch upsert accepts a single record or an array; the response reports
//! how many records were written. Listing annotates each plan with the
//! 24-hour recently-changed flag.

use crate::services::plan_ingest::{self, PlanInput, PlanListing};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

/// GET /api/plans
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanListing>>> {
    let plans = plan_ingest::list_plans_with_recency(&state.db).await?;
    Ok(Json(plans))
}

/// POST /api/plans - one record or an array of records
async fn upsert(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let batch: Vec<PlanInput> = if body.is_array() {
        serde_json::from_value(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid plan payload: {e}")))?
    } else {
        let single: PlanInput = serde_json::from_value(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid plan payload: {e}")))?;
        vec![single]
    };

    let count = plan_ingest::upsert_plans(&state.db, &batch).await?;
    info!(count, total = batch.len(), "Processed plan batch");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Plans processed successfully",
            "count": count,
        })),
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/plans", get(list).post(upsert))
}
