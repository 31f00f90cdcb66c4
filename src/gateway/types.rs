//! Request extractors and response envelopes
//!
//! Every JSON body is read through [`ApiJson`], so malformed input comes back
//! as the same `{error, code}` shape as any other validation failure.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

use crate::catalog::{AddonView, PlanView};
use crate::error::ServiceError;
use crate::models::{Complaint, Order, Subscription, User};

// ============================================================================
// ApiJson: Json extractor with structured rejections
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ServiceError {
    tracing::debug!("Rejected JSON body: {}", rejection.body_text());
    ServiceError::Validation(rejection.body_text())
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct MakeAdminRequest {
    #[serde(default)]
    #[schema(example = "testuser@example.com")]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Fresh Fold API")]
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "User promoted to admin")]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlansResponse {
    pub plans: Vec<PlanView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddonsResponse {
    pub addons: Vec<AddonView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuburbsResponse {
    #[schema(example = json!(["Geelong", "Newtown"]))]
    pub suburbs: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEnvelope {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersEnvelope {
    pub orders: Vec<Order>,
}

/// `subscription` is `null` when the caller has nothing live
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionEnvelope {
    pub subscription: Option<Subscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintEnvelope {
    pub complaint: Complaint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintsEnvelope {
    pub complaints: Vec<Complaint>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotFoundBody {
    #[schema(example = "Not found")]
    pub error: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: String,
    }

    fn json_request(body: &'static str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let err = ApiJson::<Probe>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_wellformed_body_extracts() {
        let ApiJson(probe) = ApiJson::<Probe>::from_request(json_request(r#"{"name":"x"}"#), &())
            .await
            .unwrap();
        assert_eq!(probe.name, "x");
    }

    #[test]
    fn test_empty_subscription_serializes_null() {
        let json = serde_json::to_value(SubscriptionEnvelope {
            subscription: None,
            message: None,
        })
        .unwrap();
        assert!(json["subscription"].is_null());
        assert!(json.get("message").is_none());
    }
}
