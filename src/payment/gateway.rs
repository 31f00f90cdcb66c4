//! Checkout session gateways

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::PaymentError;
use crate::config::PaymentConfig;

/// What the caller wants to charge
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub order_id: String,
    pub tracking_id: String,
    pub product_name: String,
    /// Already rounded to cents
    pub amount: Decimal,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl SessionRequest {
    /// Amount in the currency's minor unit
    pub fn unit_amount(&self) -> Result<i64, PaymentError> {
        (self.amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| {
                PaymentError::InvalidResponse(format!("amount out of range: {}", self.amount))
            })
    }
}

/// Gateway view of a checkout session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, req: &SessionRequest) -> Result<CheckoutSession, PaymentError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError>;
}

// ============================================================================
// Stripe-compatible REST gateway
// ============================================================================

pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PaymentError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn decode(response: reqwest::Response) -> Result<CheckoutSession, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, req: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        let unit_amount = req.unit_amount()?.to_string();
        let description = format!("Order {}", req.tracking_id);
        let form: [(&str, &str); 11] = [
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", req.currency.as_str()),
            ("line_items[0][price_data][unit_amount]", unit_amount.as_str()),
            ("line_items[0][price_data][product_data][name]", req.product_name.as_str()),
            ("line_items[0][price_data][product_data][description]", description.as_str()),
            ("success_url", req.success_url.as_str()),
            ("cancel_url", req.cancel_url.as_str()),
            ("metadata[orderId]", req.order_id.as_str()),
            ("metadata[trackingId]", req.tracking_id.as_str()),
        ];

        debug!(order_id = %req.order_id, unit_amount = %unit_amount, "Creating checkout session");
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        Self::decode(response).await
    }
}

// ============================================================================
// Disabled gateway
// ============================================================================

/// Every call fails with [`PaymentError::Disabled`]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_session(&self, _req: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError::Disabled)
    }

    async fn retrieve_session(&self, _session_id: &str) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError::Disabled)
    }
}

/// Build the gateway described by config.
///
/// Falls back to [`DisabledGateway`] when payments are off or no key is set.
pub fn from_config(config: &PaymentConfig) -> Arc<dyn PaymentGateway> {
    match (&config.secret_key, config.enabled) {
        (Some(key), true) if !key.is_empty() => match StripeGateway::new(&config.api_base, key) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                warn!("Payment gateway disabled: {}", e);
                Arc::new(DisabledGateway)
            }
        },
        _ => Arc::new(DisabledGateway),
    }
}

// ============================================================================
// Mock gateway
// ============================================================================

/// In-process gateway for tests: sessions are kept in memory and can be
/// marked paid.
#[derive(Default)]
pub struct MockGateway {
    sessions: DashMap<String, CheckoutSession>,
    next_id: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the customer completing payment
    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                session.payment_status = Some("paid".to_string());
                session.status = Some("complete".to_string());
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(&self, req: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_test_{:08}", seq);
        let session = CheckoutSession {
            url: Some(format!("https://checkout.test/pay/{}", id)),
            id: id.clone(),
            payment_status: Some("unpaid".to_string()),
            status: Some("open".to_string()),
            amount_total: Some(req.unit_amount()?),
            currency: Some(req.currency.clone()),
        };
        self.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        self.sessions
            .get(session_id)
            .map(|s| s.clone())
            .ok_or_else(|| PaymentError::Rejected {
                status: 404,
                message: format!("No such checkout.session: {}", session_id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(amount: &str) -> SessionRequest {
        SessionRequest {
            order_id: "order-1".into(),
            tracking_id: "FF-0000ABCD".into(),
            product_name: "Fresh Fold - One-Off Wash".into(),
            amount: Decimal::from_str(amount).unwrap(),
            currency: "aud".into(),
            success_url: "http://localhost/?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "http://localhost/?cancelled=true".into(),
        }
    }

    #[test]
    fn test_unit_amount_in_cents() {
        assert_eq!(request("75.78").unit_amount().unwrap(), 7578);
        assert_eq!(request("19.9").unit_amount().unwrap(), 1990);
    }

    #[tokio::test]
    async fn test_disabled_gateway_always_fails() {
        let gw = DisabledGateway;
        assert_eq!(
            gw.create_session(&request("1")).await.unwrap_err(),
            PaymentError::Disabled
        );
        assert!(gw.retrieve_session("cs_x").await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_without_key_is_disabled() {
        let config = PaymentConfig {
            enabled: true,
            secret_key: None,
            ..PaymentConfig::default()
        };
        let gw = from_config(&config);
        assert_eq!(
            gw.create_session(&request("1")).await.unwrap_err(),
            PaymentError::Disabled
        );
    }

    #[tokio::test]
    async fn test_mock_gateway_session_lifecycle() {
        let gw = MockGateway::new();
        let session = gw.create_session(&request("75.78")).await.unwrap();
        assert!(session.url.as_deref().unwrap().contains(&session.id));
        assert_eq!(session.amount_total, Some(7578));

        let fetched = gw.retrieve_session(&session.id).await.unwrap();
        assert_eq!(fetched.payment_status.as_deref(), Some("unpaid"));

        assert!(gw.mark_paid(&session.id));
        let fetched = gw.retrieve_session(&session.id).await.unwrap();
        assert_eq!(fetched.payment_status.as_deref(), Some("paid"));

        assert!(gw.retrieve_session("cs_missing").await.is_err());
    }
}
