//! Booking and tracking handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::{ErrorBody, ServiceError};
use crate::gateway::services::{CreateBookingRequest, TrackingView, UpdateOrderRequest};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiJson, OrderEnvelope, OrdersEnvelope};
use crate::user_auth::AuthUser;

/// Create a booking (guest or signed-in)
///
/// Suburb is checked first; an unserviceable suburb creates nothing.
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = OrderEnvelope),
        (status = 400, description = "Unserviceable suburb or invalid booking", body = ErrorBody)
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    caller: Option<Extension<AuthUser>>,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ServiceError> {
    let user = caller.as_ref().map(|Extension(AuthUser(u))| u);
    let order = state.bookings.create(user, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            order,
            message: Some("Booking created successfully".to_string()),
        }),
    ))
}

/// The caller's bookings, newest first
#[utoipa::path(
    get,
    path = "/api/bookings",
    responses(
        (status = 200, description = "Caller's orders", body = OrdersEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<OrdersEnvelope>, ServiceError> {
    let orders = state.bookings.list_for_user(&user).await?;
    Ok(Json(OrdersEnvelope { orders }))
}

/// One booking; visible to its owner and to admins
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderEnvelope),
        (status = 404, description = "Order not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<OrderEnvelope>, ServiceError> {
    let order = state.bookings.get(&id).await?;
    if !user.is_admin() && order.user_id != Some(user.id) {
        return Err(ServiceError::not_found("Order not found"));
    }
    Ok(Json(OrderEnvelope {
        order,
        message: None,
    }))
}

/// Advance tracking status / confirm items (admin)
#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderEnvelope),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateOrderRequest>,
) -> Result<Json<OrderEnvelope>, ServiceError> {
    let order = state.bookings.update_status(&id, req).await?;
    tracing::info!("[TRACE] Booking {}: status {}", order.tracking_id, order.status);
    Ok(Json(OrderEnvelope {
        order,
        message: None,
    }))
}

/// Public tracking lookup
#[utoipa::path(
    get,
    path = "/api/tracking/{tracking_id}",
    params(("tracking_id" = String, Path, description = "Tracking id, e.g. FF-1A2B3C4D")),
    responses(
        (status = 200, description = "Tracking view", body = TrackingView),
        (status = 404, description = "Tracking ID not found", body = ErrorBody)
    ),
    tag = "Bookings"
)]
pub async fn track_order(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> Result<Json<TrackingView>, ServiceError> {
    Ok(Json(state.bookings.tracking(&tracking_id).await?))
}
