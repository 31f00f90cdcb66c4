//! Domain records: users, orders, subscriptions, complaints, payments.
//!
//! Wire format is camelCase JSON; money fields serialize as JSON numbers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pricing::{BookingKind, PricedAddon};
use crate::subscription::SubscriptionStatus;

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// Denormalized view of the user's live subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub plan_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always lower-cased
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    pub suburb: String,
    pub role: Role,
    pub subscription: Option<SubscriptionSummary>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ============================================================================
// Order
// ============================================================================

/// Tracking statuses in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[serde(rename = "Picked Up")]
    PickedUp,
    #[serde(rename = "Facility Intake")]
    FacilityIntake,
    #[serde(rename = "Washing")]
    Washing,
    #[serde(rename = "Drying")]
    Drying,
    #[serde(rename = "Ironing")]
    Ironing,
    #[serde(rename = "Quality Check")]
    QualityCheck,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::OrderPlaced,
        OrderStatus::PickedUp,
        OrderStatus::FacilityIntake,
        OrderStatus::Washing,
        OrderStatus::Drying,
        OrderStatus::Ironing,
        OrderStatus::QualityCheck,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "Order Placed",
            OrderStatus::PickedUp => "Picked Up",
            OrderStatus::FacilityIntake => "Facility Intake",
            OrderStatus::Washing => "Washing",
            OrderStatus::Drying => "Drying",
            OrderStatus::Ironing => "Ironing",
            OrderStatus::QualityCheck => "Quality Check",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Initiated,
    /// Gateway was down at checkout; payment is collected later
    PendingManual,
    GatewayError,
    Unpaid,
    Paid,
    NoPaymentRequired,
}

impl PaymentStatus {
    /// Map a gateway `payment_status` string
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "paid" => PaymentStatus::Paid,
            "no_payment_required" => PaymentStatus::NoPaymentRequired,
            _ => PaymentStatus::Unpaid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::PendingManual => "pending_manual",
            PaymentStatus::GatewayError => "gateway_error",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::NoPaymentRequired => "no_payment_required",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub tracking_id: String,
    pub user_id: Option<Uuid>,
    pub guest_email: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    #[serde(rename = "type")]
    pub kind: BookingKind,
    pub plan_id: Option<String>,
    pub plan_name: String,
    pub suburb: String,
    pub pickup_date: NaiveDate,
    pub pickup_time_slot: String,
    pub delivery_preference: String,
    pub items: u32,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub weight_kg: Option<Decimal>,
    pub instructions: String,
    pub addons: Vec<PricedAddon>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub base_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub addons_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 75.78)]
    pub total: Decimal,
    pub status: OrderStatus,
    /// Append-only
    pub status_history: Vec<StatusEntry>,
    pub payment_status: PaymentStatus,
    pub qr_code: String,
    pub tracking_url: String,
    pub items_confirmed: bool,
    pub confirmed_items: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Append a status transition and move the current status forward
    pub fn push_status(&mut self, status: OrderStatus, note: impl Into<String>, at: DateTime<Utc>) {
        self.status = status;
        self.status_history.push(StatusEntry {
            status,
            timestamp: at,
            note: note.into(),
        });
        self.updated_at = at;
    }
}

// ============================================================================
// Subscription
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: String,
    pub plan_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub status: SubscriptionStatus,
    pub pickups_used: u32,
    pub pickups_per_month: u32,
    pub max_weight_kg: i32,
    pub paused_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn summary(&self) -> SubscriptionSummary {
        SubscriptionSummary {
            plan_id: self.plan_id.clone(),
            plan_name: self.plan_name.clone(),
            status: self.status,
        }
    }
}

// ============================================================================
// Complaint
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminNote {
    pub note: String,
    pub timestamp: DateTime<Utc>,
    pub admin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    pub ticket_number: String,
    pub order_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub user_email: String,
    pub category: String,
    pub description: String,
    pub photo_url: Option<String>,
    pub status: ComplaintStatus,
    pub resolution: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub refund_amount: Option<Decimal>,
    pub admin_notes: Vec<AdminNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Payment
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_labels_roundtrip() {
        for s in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_label(s.as_str()), Some(s));
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
        }
        assert_eq!(OrderStatus::from_label("Lost"), None);
    }

    #[test]
    fn test_payment_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PendingManual).unwrap(),
            r#""pending_manual""#
        );
        assert_eq!(PaymentStatus::from_gateway("paid"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_gateway("unpaid"), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User {
            id: uuid::Uuid::nil(),
            name: "Test".into(),
            email: "t@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            phone: String::new(),
            suburb: String::new(),
            role: Role::Customer,
            subscription: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "customer");
        assert!(json["subscription"].is_null());
    }
}
