//! Checkout handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::error::{ErrorBody, ServiceError};
use crate::gateway::services::{CheckoutOutcome, CheckoutRequest, CheckoutStatus};
use crate::gateway::state::AppState;
use crate::gateway::types::ApiJson;

/// Open a payment session for an order.
///
/// A gateway outage still answers 200, with `error`, `orderId` and
/// `trackingId` instead of `url`.
#[utoipa::path(
    post,
    path = "/api/checkout/session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Session URL or gateway-unavailable notice", body = CheckoutOutcome),
        (status = 400, description = "orderId and originUrl required", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Order already paid", body = ErrorBody)
    ),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutOutcome>, ServiceError> {
    Ok(Json(state.checkout.create_session(req).await?))
}

#[utoipa::path(
    get,
    path = "/api/checkout/status/{session_id}",
    params(("session_id" = String, Path, description = "Gateway session id")),
    responses(
        (status = 200, description = "Payment status", body = CheckoutStatus),
        (status = 404, description = "Transaction not found", body = ErrorBody)
    ),
    tag = "Checkout"
)]
pub async fn checkout_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutStatus>, ServiceError> {
    Ok(Json(state.checkout.status(&session_id).await?))
}
