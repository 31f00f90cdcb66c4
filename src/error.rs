//! Service error taxonomy.
//!
//! Every failure a handler can return maps to one HTTP status and one stable
//! SCREAMING_CASE code. The JSON body is always `{ "error": <message>, "code": <code> }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::pricing::PricingError;
use crate::store::StoreError;
use crate::subscription::SubscriptionError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Unserviceable suburb
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::Auth(_) => "UNAUTHORIZED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ServiceError::Subscription(e) => e.code(),
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::ServiceUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Subscription(e) => match e {
                SubscriptionError::InvalidTransition { .. }
                | SubscriptionError::AlreadySubscribed(_) => StatusCode::CONFLICT,
                SubscriptionError::NoLiveSubscription => StatusCode::NOT_FOUND,
                SubscriptionError::InvalidPlan(_) | SubscriptionError::MissingPlan => {
                    StatusCode::BAD_REQUEST
                }
            },
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PricingError> for ServiceError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::ServiceUnavailable => ServiceError::ServiceUnavailable(e.to_string()),
            PricingError::Validation(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let messages: Vec<String> = fields
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
            })
            .collect();
        ServiceError::Validation(messages.join("; "))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => ServiceError::Conflict(e.to_string()),
            StoreError::NotFound { .. } => ServiceError::NotFound(e.to_string()),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Service not available in this suburb.")]
    pub error: String,
    #[schema(example = "SERVICE_UNAVAILABLE")]
    pub code: &'static str,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
