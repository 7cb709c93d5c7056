use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::StoreError;

pub mod content;
pub mod dashboard;
pub mod sessions;

/// HTTP-facing wrapper around the shared error taxonomy. Every handler
/// returns this so status mapping lives in exactly one place.
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "safetyquiz-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
