//! Checkout Service
//!
//! Opens a payment session for an order and reconciles its status later.
//!
//! A gateway outage never fails the request: the transaction is recorded as
//! `gateway_error`, the order moves to `pending_manual`, and the caller gets a
//! structured `error` so payment can be completed another way.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core_types::new_id;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Order, PaymentStatus, PaymentTransaction};
use crate::payment::{PaymentError, PaymentGateway, SessionRequest};
use crate::store::{OrderRepository, PaymentRepository};

pub const GATEWAY_UNAVAILABLE_MSG: &str =
    "Payment gateway unavailable. Your order has been created and payment can be completed later.";

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    #[schema(example = "https://freshfold.example/checkout")]
    pub origin_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    Session {
        url: String,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    GatewayUnavailable {
        error: String,
        #[serde(rename = "orderId")]
        order_id: Uuid,
        #[serde(rename = "trackingId")]
        tracking_id: String,
    },
}

/// Snake-case keys mirror the gateway's own session fields
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CheckoutStatus {
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct CheckoutService {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        currency: &str,
    ) -> Self {
        Self {
            orders,
            payments,
            gateway,
            currency: currency.to_lowercase(),
        }
    }

    pub async fn create_session(&self, req: CheckoutRequest) -> ServiceResult<CheckoutOutcome> {
        let order_id = req.order_id.trim();
        let origin_url = req.origin_url.trim();
        if order_id.is_empty() || origin_url.is_empty() {
            return Err(ServiceError::validation("orderId and originUrl required"));
        }

        let mut order = self.load_order(order_id).await?;
        if order.is_paid() {
            return Err(ServiceError::Conflict("Order already paid".into()));
        }

        let session_req = SessionRequest {
            order_id: order.id.to_string(),
            tracking_id: order.tracking_id.clone(),
            product_name: format!("Fresh Fold - {}", order.plan_name),
            amount: order.total,
            currency: self.currency.clone(),
            success_url: format!(
                "{}?session_id={{CHECKOUT_SESSION_ID}}&order_id={}",
                origin_url, order.id
            ),
            cancel_url: format!("{}?cancelled=true&order_id={}", origin_url, order.id),
        };

        let now = Utc::now();
        let mut tx = PaymentTransaction {
            id: new_id(),
            order_id: order.id,
            user_id: order.user_id,
            amount: order.total,
            currency: self.currency.clone(),
            payment_status: PaymentStatus::Initiated,
            session_id: None,
            checkout_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        match self.open_session(&session_req).await {
            Ok((session_id, url)) => {
                tx.session_id = Some(session_id.clone());
                tx.checkout_url = Some(url.clone());
                self.payments.insert_transaction(tx).await?;
                tracing::info!(
                    "[TRACE] Checkout {}: ✅ session {} opened",
                    order.tracking_id,
                    session_id
                );
                Ok(CheckoutOutcome::Session { url, session_id })
            }
            Err(e) => {
                tracing::warn!(
                    tracking_id = %order.tracking_id,
                    "Payment gateway unavailable: {}",
                    e
                );
                tx.payment_status = PaymentStatus::GatewayError;
                tx.error = Some(e.to_string());
                self.payments.insert_transaction(tx).await?;

                order.payment_status = PaymentStatus::PendingManual;
                order.updated_at = now;
                self.orders.update_order(order.clone()).await?;

                Ok(CheckoutOutcome::GatewayUnavailable {
                    error: GATEWAY_UNAVAILABLE_MSG.to_string(),
                    order_id: order.id,
                    tracking_id: order.tracking_id,
                })
            }
        }
    }

    /// Refresh a session from the gateway and settle the order once paid
    pub async fn status(&self, session_id: &str) -> ServiceResult<CheckoutStatus> {
        let mut tx = self
            .payments
            .get_transaction_by_session(session_id.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction not found"))?;

        let session = match self.gateway.retrieve_session(session_id.trim()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(session_id, "Checkout status refresh failed: {}", e);
                return Ok(CheckoutStatus {
                    payment_status: tx.payment_status.as_str().to_string(),
                    status: None,
                    amount_total: None,
                    currency: None,
                    error: Some(e.to_string()),
                });
            }
        };

        let payment_status = session
            .payment_status
            .clone()
            .unwrap_or_else(|| "unpaid".to_string());

        if tx.payment_status != PaymentStatus::Paid {
            let now = Utc::now();
            tx.payment_status = PaymentStatus::from_gateway(&payment_status);
            tx.updated_at = now;
            self.payments.update_transaction(tx.clone()).await?;

            if tx.payment_status == PaymentStatus::Paid {
                if let Some(mut order) = self.orders.get_order(tx.order_id).await? {
                    order.payment_status = PaymentStatus::Paid;
                    order.updated_at = now;
                    self.orders.update_order(order).await?;
                    tracing::info!("[TRACE] Checkout {}: ✅ order paid", session_id);
                }
            }
        }

        Ok(CheckoutStatus {
            payment_status,
            status: session.status,
            amount_total: session.amount_total,
            currency: session.currency,
            error: None,
        })
    }

    async fn load_order(&self, order_id: &str) -> ServiceResult<Order> {
        let not_found = || ServiceError::not_found("Order not found");
        let id = Uuid::parse_str(order_id).map_err(|_| not_found())?;
        self.orders.get_order(id).await?.ok_or_else(not_found)
    }

    async fn open_session(&self, req: &SessionRequest) -> Result<(String, String), PaymentError> {
        let session = self.gateway.create_session(req).await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::InvalidResponse("session has no url".into()))?;
        Ok((session.id, url))
    }
}
