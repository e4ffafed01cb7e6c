//! Health check endpoint

use crate::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// GET /health - liveness probe, no side effects
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "hometrack-catalog",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
