//! Company endpoints
//!
//! Direct creation, listing, deletion, and the AI-assisted enrichment path.
//! Companies are the strict side of the resolver asymmetry: nothing here is
//! ever created implicitly by membership operations.

use crate::db::companies::{self, Company};
use crate::services::resolver;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub founded: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCompanyParams {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrichCompanyRequest {
    #[serde(default)]
    pub company_name: Option<String>,
}

/// GET /api/companies
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    let companies = companies::list_companies(&state.db).await?;
    Ok(Json(companies))
}

/// POST /api/companies
async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Company name is required".to_string()))?;

    if companies::find_by_name_exact(&state.db, name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Company already exists".to_string()));
    }

    let mut company = Company::new(name.to_string());
    company.description = payload.description;
    company.website = payload.website;
    company.headquarters = payload.headquarters;
    company.founded = payload.founded;

    match companies::insert_company(&state.db, &company).await {
        Ok(()) => {}
        Err(hometrack_common::Error::Database(ref e)) if crate::db::is_unique_violation(e) => {
            return Err(ApiError::Conflict("Company already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(company = %company.name, "Created company");
    Ok((StatusCode::CREATED, Json(company)))
}

/// DELETE /api/companies?id=<guid>
async fn delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteCompanyParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = params
        .id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Company ID is required".to_string()))?;
    let guid = Uuid::parse_str(id)
        .map_err(|_| ApiError::BadRequest("Invalid company ID".to_string()))?;

    let deleted = companies::delete_company(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    info!(company = %deleted.name, "Deleted company");
    Ok(Json(json!({
        "message": "Company deleted successfully",
        "company": deleted,
    })))
}

/// POST /api/companies/ai
///
/// Creates a company from facts fetched off the text-generation service.
/// The requested name always wins over whatever name the model returns.
async fn create_with_ai(
    State(state): State<AppState>,
    Json(payload): Json<EnrichCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let name = payload
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Company name is required".to_string()))?;

    let client = state.enrichment.as_ref().ok_or_else(|| {
        ApiError::Internal("Text-generation API key is not configured".to_string())
    })?;

    if let Some(existing) = resolver::resolve_company(&state.db, name).await? {
        return Err(ApiError::ConflictWith(
            "Company already exists".to_string(),
            json!({ "company": existing }),
        ));
    }

    let profile = client
        .company_profile(name)
        .await
        .map_err(|e| ApiError::Internal(format!("Enrichment service error: {e}")))?;

    let mut company = Company::new(name.to_string());
    company.founded = profile.founded_year();
    company.description = profile.description;
    company.website = profile.website;
    company.headquarters = profile.headquarters;

    match companies::insert_company(&state.db, &company).await {
        Ok(()) => {}
        Err(hometrack_common::Error::Database(ref e)) if crate::db::is_unique_violation(e) => {
            return Err(ApiError::Conflict("Company already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(company = %company.name, "Created company via enrichment");
    Ok((StatusCode::CREATED, Json(company)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list).post(create).delete(delete))
        .route("/api/companies/ai", post(create_with_ai))
}
