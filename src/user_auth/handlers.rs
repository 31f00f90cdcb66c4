use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::middleware::AuthUser;
use super::service::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{ErrorBody, ServiceError};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiJson, MakeAdminRequest, MessageResponse, UserEnvelope};

/// Register a new user
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let resp = state.user_auth.register(req).await.inspect_err(|e| {
        tracing::warn!("Registration rejected: {}", e);
    })?;
    tracing::info!("[TRACE] Register {}: ✅", resp.user.email);
    Ok(Json(resp))
}

/// Login user
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let resp = state.user_auth.login(req).await.inspect_err(|e| {
        tracing::warn!("Login failed: {}", e);
    })?;
    Ok(Json(resp))
}

/// Current user
///
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserEnvelope> {
    Json(UserEnvelope { user })
}

/// Grant the admin role to an existing user (admin only)
///
/// POST /api/auth/make-admin
#[utoipa::path(
    post,
    path = "/api/auth/make-admin",
    request_body = MakeAdminRequest,
    responses(
        (status = 200, description = "User promoted", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn make_admin(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    ApiJson(req): ApiJson<MakeAdminRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.user_auth.make_admin(&caller, &req.email).await?;
    Ok(Json(MessageResponse {
        message: "User promoted to admin".to_string(),
    }))
}
