//! hometrack-catalog library - catalog and price tracking service
//!
//! CRUD over companies, communities, and home plans, with the entity
//! reconciliation layer (polymorphic membership references, legacy
//! migration, unified community view) and price-change bookkeeping.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::enrichment::EnrichmentClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Enrichment client; None when no API key is configured, which disables
    /// the AI-assisted company creation endpoint
    pub enrichment: Option<EnrichmentClient>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, enrichment: Option<EnrichmentClient>) -> Self {
        Self { db, enrichment }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health::routes())
        .merge(api::companies::routes())
        .merge(api::communities::routes())
        .merge(api::membership::routes())
        .merge(api::plans::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
