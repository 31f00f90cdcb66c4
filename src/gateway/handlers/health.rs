//! Health check and fallback handlers

use axum::{Json, http::StatusCode, http::Uri};

use super::super::types::{HealthResponse, NotFoundBody};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "Fresh Fold API".to_string(),
        version: format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")),
    })
}

/// Any route that matched nothing
pub async fn not_found(uri: Uri) -> (StatusCode, Json<NotFoundBody>) {
    tracing::debug!("No route for {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            error: "Not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}
