//! Complaint handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::{ErrorBody, ServiceError};
use crate::gateway::services::{CreateComplaintRequest, UpdateComplaintRequest};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiJson, ComplaintEnvelope, ComplaintsEnvelope};
use crate::user_auth::AuthUser;

/// File a complaint (guest or signed-in)
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Complaint filed", body = ComplaintEnvelope),
        (status = 400, description = "Missing category or description", body = ErrorBody),
        (status = 404, description = "Linked order not found", body = ErrorBody)
    ),
    tag = "Complaints"
)]
pub async fn create_complaint(
    State(state): State<Arc<AppState>>,
    caller: Option<Extension<AuthUser>>,
    ApiJson(req): ApiJson<CreateComplaintRequest>,
) -> Result<(StatusCode, Json<ComplaintEnvelope>), ServiceError> {
    let user = caller.as_ref().map(|Extension(AuthUser(u))| u);
    let complaint = state.complaints.create(user, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ComplaintEnvelope {
            message: Some(format!(
                "Complaint submitted. Ticket: {}",
                complaint.ticket_number
            )),
            complaint,
        }),
    ))
}

/// Caller's complaints (all complaints for admins)
#[utoipa::path(
    get,
    path = "/api/complaints",
    responses(
        (status = 200, description = "Complaints", body = ComplaintsEnvelope),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Complaints"
)]
pub async fn list_complaints(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<ComplaintsEnvelope>, ServiceError> {
    let complaints = state.complaints.list(&user).await?;
    Ok(Json(ComplaintsEnvelope { complaints }))
}

/// Resolve, refund or annotate a complaint (admin)
#[utoipa::path(
    put,
    path = "/api/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id")),
    request_body = UpdateComplaintRequest,
    responses(
        (status = 200, description = "Updated complaint", body = ComplaintEnvelope),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Complaint not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_complaint(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(admin)): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateComplaintRequest>,
) -> Result<Json<ComplaintEnvelope>, ServiceError> {
    let complaint = state.complaints.update(&admin, &id, req).await?;
    Ok(Json(ComplaintEnvelope {
        complaint,
        message: None,
    }))
}
