//! Admin-only reporting handlers
//!
//! Mounted behind the admin layer; order and complaint updates reuse the
//! booking and complaint handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::error::{ErrorBody, ServiceError};
use crate::gateway::services::AdminStats;
use crate::gateway::state::AppState;
use crate::gateway::types::{ComplaintsEnvelope, OrderFilter, OrdersEnvelope};
use crate::user_auth::AuthUser;

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Aggregate statistics", body = AdminStats),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminStats>, ServiceError> {
    Ok(Json(state.admin.stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(("status" = Option<String>, Query, description = "Tracking status label, e.g. Washing")),
    responses(
        (status = 200, description = "Orders, newest first", body = OrdersEnvelope),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_admin_orders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<OrdersEnvelope>, ServiceError> {
    let orders = state.admin.list_orders(filter.status.as_deref()).await?;
    Ok(Json(OrdersEnvelope { orders }))
}

#[utoipa::path(
    get,
    path = "/api/admin/complaints",
    responses(
        (status = 200, description = "All complaints", body = ComplaintsEnvelope),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_admin_complaints(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(admin)): Extension<AuthUser>,
) -> Result<Json<ComplaintsEnvelope>, ServiceError> {
    let complaints = state.complaints.list(&admin).await?;
    Ok(Json(ComplaintsEnvelope { complaints }))
}
