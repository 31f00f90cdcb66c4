//! Booking Service - order creation, lookup, tracking and status updates
//!
//! Pricing is delegated to [`crate::pricing::price_booking`]; this service
//! owns the side effects: tracking id allocation, QR payload, persistence.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog;
use crate::core_types::{CODE_ALLOCATION_ATTEMPTS, new_id, new_tracking_id};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Order, OrderStatus, PaymentStatus, StatusEntry, User};
use crate::pricing::{
    AddonSelection, BookingKind, PricingRequest, SERVICE_UNAVAILABLE_MSG, price_booking,
};
use crate::store::OrderRepository;

pub const ONE_OFF_PLAN_NAME: &str = "One-Off Service";

/// POST /api/bookings body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default, rename = "type")]
    pub kind: BookingKind,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    #[schema(example = "Geelong")]
    pub suburb: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    #[schema(example = "2026-10-21")]
    pub pickup_date: Option<String>,
    #[serde(default)]
    #[schema(example = "10:00 AM - 12:00 PM")]
    pub pickup_time_slot: Option<String>,
    #[serde(default)]
    pub delivery_preference: Option<String>,
    #[serde(default)]
    pub items: Option<u32>,
    /// Number or decimal string
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 8.5)]
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub addons: Vec<AddonSelection>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_phone: Option<String>,
}

/// Admin status update body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// Tracking status label, e.g. "Washing"
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub items_confirmed: Option<bool>,
    #[serde(default)]
    pub confirmed_items: Option<u32>,
}

/// Public tracking page payload
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub tracking_id: String,
    pub status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
    pub plan_name: String,
    pub suburb: String,
    pub pickup_date: NaiveDate,
    pub pickup_time_slot: String,
    pub items: u32,
    pub items_confirmed: bool,
    pub confirmed_items: Option<u32>,
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for TrackingView {
    fn from(o: Order) -> Self {
        Self {
            tracking_id: o.tracking_id,
            status: o.status,
            status_history: o.status_history,
            plan_name: o.plan_name,
            suburb: o.suburb,
            pickup_date: o.pickup_date,
            pickup_time_slot: o.pickup_time_slot,
            items: o.items,
            items_confirmed: o.items_confirmed,
            confirmed_items: o.confirmed_items,
            qr_code: o.qr_code,
            created_at: o.created_at,
        }
    }
}

pub struct BookingService {
    orders: Arc<dyn OrderRepository>,
    public_base_url: String,
}

impl BookingService {
    pub fn new(orders: Arc<dyn OrderRepository>, public_base_url: &str) -> Self {
        Self {
            orders,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tracking_url(&self, tracking_id: &str) -> String {
        format!("{}?track={}", self.public_base_url, tracking_id)
    }

    /// Validate, price and persist a booking.
    ///
    /// Nothing is written unless every check passes.
    pub async fn create(
        &self,
        user: Option<&User>,
        req: CreateBookingRequest,
    ) -> ServiceResult<Order> {
        // 1. Service area comes before anything else
        if catalog::serviceable_suburb(&req.suburb).is_none() {
            return Err(ServiceError::ServiceUnavailable(SERVICE_UNAVAILABLE_MSG.into()));
        }

        // 2. Pickup window
        let (pickup_date, pickup_time_slot) =
            match (req.pickup_date.as_deref(), non_empty(req.pickup_time_slot.as_deref())) {
                (Some(date), Some(slot)) if !date.trim().is_empty() => {
                    (parse_pickup_date(date)?, slot.to_string())
                }
                _ => {
                    return Err(ServiceError::validation(
                        "Pickup date and time slot required",
                    ));
                }
            };

        // 3. Price
        let quote = price_booking(&PricingRequest {
            kind: req.kind,
            plan_id: req.plan_id.as_deref(),
            suburb: &req.suburb,
            weight_kg: req.weight_kg,
            addons: &req.addons,
        })?;

        let now = Utc::now();
        let mut order = Order {
            id: new_id(),
            tracking_id: String::new(),
            user_id: user.map(|u| u.id),
            guest_email: req.guest_email.filter(|s| !s.is_empty()),
            guest_name: req.guest_name.filter(|s| !s.is_empty()),
            guest_phone: req.guest_phone.filter(|s| !s.is_empty()),
            kind: req.kind,
            plan_id: quote.plan.map(|p| p.id.to_string()),
            plan_name: quote
                .plan
                .map_or(ONE_OFF_PLAN_NAME, |p| p.name)
                .to_string(),
            suburb: quote.suburb.to_string(),
            pickup_date,
            pickup_time_slot,
            delivery_preference: req
                .delivery_preference
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "standard".to_string()),
            items: req.items.unwrap_or(0),
            weight_kg: quote.weight_kg,
            instructions: req.instructions.unwrap_or_default(),
            addons: quote.addons,
            base_cost: quote.base_cost,
            addons_total: quote.addons_total,
            subtotal: quote.subtotal,
            gst: quote.gst,
            total: quote.total,
            status: OrderStatus::OrderPlaced,
            status_history: vec![StatusEntry {
                status: OrderStatus::OrderPlaced,
                timestamp: now,
                note: "Order created".to_string(),
            }],
            payment_status: PaymentStatus::Pending,
            qr_code: String::new(),
            tracking_url: String::new(),
            items_confirmed: false,
            confirmed_items: None,
            created_at: now,
            updated_at: now,
        };

        // 4. Allocate a tracking id; the store rejects duplicates
        for attempt in 1..=CODE_ALLOCATION_ATTEMPTS {
            let tracking_id = new_tracking_id();
            order.tracking_url = self.tracking_url(&tracking_id);
            order.qr_code = qr_payload(&order.tracking_url);
            order.tracking_id = tracking_id;

            match self.orders.insert_order(order.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        "[TRACE] Booking {}: ✅ created ({}, total {})",
                        order.tracking_id,
                        order.suburb,
                        order.total
                    );
                    return Ok(order);
                }
                Err(e) if e.is_conflict() => {
                    tracing::warn!(attempt, "Tracking id collision: {}", order.tracking_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Internal(
            "Could not allocate a unique tracking id".into(),
        ))
    }

    pub async fn list_for_user(&self, user: &User) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list_orders_for_user(user.id).await?)
    }

    pub async fn get(&self, order_id: &str) -> ServiceResult<Order> {
        let id = Uuid::parse_str(order_id.trim()).map_err(|_| order_not_found())?;
        self.orders.get_order(id).await?.ok_or_else(order_not_found)
    }

    pub async fn tracking(&self, tracking_id: &str) -> ServiceResult<TrackingView> {
        self.orders
            .get_order_by_tracking(tracking_id.trim())
            .await?
            .map(TrackingView::from)
            .ok_or_else(|| ServiceError::not_found("Tracking ID not found"))
    }

    /// Admin update: appends to the status history when `status` is a known
    /// tracking label, and records the confirmed item count.
    pub async fn update_status(
        &self,
        order_id: &str,
        req: UpdateOrderRequest,
    ) -> ServiceResult<Order> {
        let mut order = self.get(order_id).await?;
        let now = Utc::now();

        if let Some(label) = req.status.as_deref() {
            match OrderStatus::from_label(label) {
                Some(status) => order.push_status(status, req.note.unwrap_or_default(), now),
                None => tracing::warn!("Ignoring unknown tracking status {:?}", label),
            }
        }
        if let Some(confirmed) = req.items_confirmed {
            order.items_confirmed = confirmed;
            if req.confirmed_items.is_some() {
                order.confirmed_items = req.confirmed_items;
            }
        }
        order.updated_at = now;

        self.orders.update_order(order.clone()).await?;
        Ok(order)
    }
}

fn order_not_found() -> ServiceError {
    ServiceError::not_found("Order not found")
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
fn parse_pickup_date(raw: &str) -> ServiceResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ServiceError::validation(format!("Invalid pickupDate: {}", raw)))
}

/// Opaque QR payload: a `data:` URI carrying the tracking URL
pub fn qr_payload(tracking_url: &str) -> String {
    format!("data:text/plain;base64,{}", BASE64.encode(tracking_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreError, StoreResult};
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> BookingService {
        BookingService::new(Arc::new(InMemoryStore::new()), "http://localhost:3000/")
    }

    fn reference_request() -> CreateBookingRequest {
        CreateBookingRequest {
            suburb: "Geelong".into(),
            pickup_date: Some("2026-10-21".into()),
            pickup_time_slot: Some("10:00 AM - 12:00 PM".into()),
            items: Some(15),
            weight_kg: Some(Decimal::from_str("8.5").unwrap()),
            addons: vec![
                AddonSelection::new("ironing", 1),
                AddonSelection::new("softener", 1),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_prices_and_tracks() {
        let svc = service();
        let order = svc.create(None, reference_request()).await.unwrap();

        assert_eq!(order.total, Decimal::from_str("75.78").unwrap());
        assert_eq!(order.status, OrderStatus::OrderPlaced);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.status_history[0].note, "Order created");
        assert_eq!(order.plan_name, ONE_OFF_PLAN_NAME);
        assert_eq!(order.delivery_preference, "standard");
        assert!(order.tracking_id.starts_with("FF-"));
        assert_eq!(
            order.tracking_url,
            format!("http://localhost:3000?track={}", order.tracking_id)
        );
        assert!(order.qr_code.starts_with("data:"));

        let view = svc.tracking(&order.tracking_id).await.unwrap();
        assert_eq!(view.suburb, "Geelong");
        assert_eq!(view.status, OrderStatus::OrderPlaced);
    }

    #[tokio::test]
    async fn test_invalid_suburb_persists_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let svc = BookingService::new(store.clone(), "http://localhost:3000");
        let mut req = reference_request();
        req.suburb = "InvalidSuburb".into();

        let err = svc.create(None, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::ServiceUnavailable(_)));
        assert!(store.list_orders(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pickup_window_required() {
        let svc = service();
        let mut req = reference_request();
        req.pickup_time_slot = Some("  ".into());
        assert_eq!(
            svc.create(None, req).await.unwrap_err(),
            ServiceError::Validation("Pickup date and time slot required".into())
        );

        let mut req = reference_request();
        req.pickup_date = Some("next tuesday".into());
        assert!(matches!(
            svc.create(None, req).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_status_update_is_append_only() {
        let svc = service();
        let order = svc.create(None, reference_request()).await.unwrap();
        let id = order.id.to_string();

        let updated = svc
            .update_status(
                &id,
                UpdateOrderRequest {
                    status: Some("Picked Up".into()),
                    note: Some("Driver collected 2 bags".into()),
                    items_confirmed: Some(true),
                    confirmed_items: Some(14),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::PickedUp);
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(updated.confirmed_items, Some(14));

        // Unknown label leaves history untouched
        let updated = svc
            .update_status(
                &id,
                UpdateOrderRequest {
                    status: Some("Teleported".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::PickedUp);
        assert_eq!(updated.status_history.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let svc = service();
        assert!(matches!(svc.get("not-a-uuid").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.get(&Uuid::new_v4().to_string()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.tracking("FF-DEADBEEF").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_qr_payload_encodes_url() {
        let qr = qr_payload("http://x?track=FF-1");
        let encoded = qr.strip_prefix("data:text/plain;base64,").unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), b"http://x?track=FF-1");
    }

    #[test]
    fn test_weight_accepts_number_or_string() {
        let a: CreateBookingRequest =
            serde_json::from_str(r#"{"suburb":"Geelong","weightKg":8.5}"#).unwrap();
        let b: CreateBookingRequest =
            serde_json::from_str(r#"{"suburb":"Geelong","weightKg":"8.5","type":"one-off"}"#)
                .unwrap();
        assert_eq!(a.weight_kg, b.weight_kg);
        assert_eq!(b.kind, BookingKind::OneOff);
    }

    #[tokio::test]
    async fn test_out_of_range_weight_is_a_validation_error() {
        let req: CreateBookingRequest = serde_json::from_str(
            r#"{"suburb":"Geelong","weightKg":7e28,"pickupDate":"2026-10-21","pickupTimeSlot":"10:00 AM - 12:00 PM"}"#,
        )
        .unwrap();
        assert!(req.weight_kg.is_some());

        let err = service().create(None, req).await.unwrap_err();
        assert_eq!(err, ServiceError::validation("Booking total is out of range"));
    }

    /// Rejects the first `collisions` inserts as tracking id conflicts
    struct CollidingOrders {
        inner: InMemoryStore,
        collisions: AtomicUsize,
        rejected: Mutex<Vec<String>>,
    }

    impl CollidingOrders {
        fn new(collisions: usize) -> Self {
            Self {
                inner: InMemoryStore::new(),
                collisions: AtomicUsize::new(collisions),
                rejected: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl OrderRepository for CollidingOrders {
        async fn insert_order(&self, order: Order) -> StoreResult<()> {
            let left = self.collisions.load(Ordering::SeqCst);
            if left > 0 {
                self.collisions.store(left - 1, Ordering::SeqCst);
                self.rejected.lock().unwrap().push(order.tracking_id.clone());
                return Err(StoreError::Conflict {
                    entity: "order",
                    key: order.tracking_id,
                });
            }
            self.inner.insert_order(order).await
        }

        async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
            self.inner.get_order(id).await
        }

        async fn get_order_by_tracking(&self, tracking_id: &str) -> StoreResult<Option<Order>> {
            self.inner.get_order_by_tracking(tracking_id).await
        }

        async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
            self.inner.list_orders_for_user(user_id).await
        }

        async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
            self.inner.list_orders(status).await
        }

        async fn update_order(&self, order: Order) -> StoreResult<()> {
            self.inner.update_order(order).await
        }
    }

    #[tokio::test]
    async fn test_tracking_id_redrawn_after_conflict() {
        let orders = Arc::new(CollidingOrders::new(1));
        let svc = BookingService::new(orders.clone(), "http://localhost:3000");

        let order = svc.create(None, reference_request()).await.unwrap();

        let rejected = orders.rejected.lock().unwrap().clone();
        assert_eq!(rejected.len(), 1);
        assert_ne!(order.tracking_id, rejected[0]);
        assert!(order.tracking_url.ends_with(&order.tracking_id));
        let stored = svc.tracking(&order.tracking_id).await.unwrap();
        assert_eq!(stored.tracking_id, order.tracking_id);
        assert!(svc.tracking(&rejected[0]).await.is_err());
    }

    #[tokio::test]
    async fn test_tracking_id_allocation_gives_up() {
        let orders = Arc::new(CollidingOrders::new(usize::MAX));
        let svc = BookingService::new(orders.clone(), "http://localhost:3000");

        let err = svc.create(None, reference_request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(orders.rejected.lock().unwrap().len(), CODE_ALLOCATION_ATTEMPTS);
        assert!(orders.inner.list_orders(None).await.unwrap().is_empty());
    }
}
