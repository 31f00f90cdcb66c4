//! Subscription handlers

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use crate::error::{ErrorBody, ServiceError};
use crate::gateway::services::{SubscribeRequest, UpdateSubscriptionRequest};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiJson, SubscriptionEnvelope};
use crate::user_auth::AuthUser;

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed", body = SubscriptionEnvelope),
        (status = 400, description = "Unknown plan", body = ErrorBody),
        (status = 409, description = "Already subscribed", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(req): ApiJson<SubscribeRequest>,
) -> Result<Json<SubscriptionEnvelope>, ServiceError> {
    let sub = state.subscriptions.subscribe(&user, &req.plan_id).await?;
    Ok(Json(SubscriptionEnvelope {
        message: Some(format!("Subscribed to {}", sub.plan_name)),
        subscription: Some(sub),
    }))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses(
        (status = 200, description = "Live subscription or null", body = SubscriptionEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<SubscriptionEnvelope>, ServiceError> {
    Ok(Json(SubscriptionEnvelope {
        subscription: state.subscriptions.current(&user).await?,
        message: None,
    }))
}

/// Pause, resume, cancel or upgrade the live subscription
#[utoipa::path(
    put,
    path = "/api/subscriptions",
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription after the action", body = SubscriptionEnvelope),
        (status = 404, description = "No live subscription", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateSubscriptionRequest>,
) -> Result<Json<SubscriptionEnvelope>, ServiceError> {
    let sub = state
        .subscriptions
        .update(&user, req.action, req.plan_id.as_deref())
        .await?;
    Ok(Json(SubscriptionEnvelope {
        message: Some(format!("Subscription {}", sub.status)),
        subscription: Some(sub),
    }))
}
