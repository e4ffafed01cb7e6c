//! Error types for the catalog API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - duplicate creation or duplicate membership
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Conflict (409) carrying the current state of the contested resource,
    /// so the caller can reconcile without re-querying
    #[error("Conflict: {0}")]
    ConflictWith(String, serde_json::Value),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<hometrack_common::Error> for ApiError {
    fn from(err: hometrack_common::Error) -> Self {
        use hometrack_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, extra) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::ConflictWith(msg, state) => {
                (StatusCode::CONFLICT, "CONFLICT", msg, Some(state))
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg, None),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
                None,
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
                None,
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        // Merge attached state (e.g. the current community on a duplicate
        // membership add) into the top level of the response body
        if let Some(serde_json::Value::Object(fields)) = extra {
            if let serde_json::Value::Object(ref mut map) = body {
                for (key, value) in fields {
                    map.insert(key, value);
                }
            }
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conflict_with_state_merges_into_body() {
        let err = ApiError::ConflictWith(
            "Company is already in this community".to_string(),
            json!({ "community": { "name": "Elevon" } }),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("parse body");
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["community"]["name"], "Elevon");
    }

    #[test]
    fn common_not_found_maps_to_api_not_found() {
        let err: ApiError = hometrack_common::Error::NotFound("Company not found".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
