//! Admin reporting

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ComplaintStatus, Order, OrderStatus};
use crate::pricing::BookingKind;
use crate::store::{ComplaintRepository, OrderRepository, UserRepository};

const RECENT_ORDERS: usize = 10;
const REVENUE_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    #[schema(example = "2026-10")]
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_orders: usize,
    /// Paid subscription orders
    pub active_subscriptions: usize,
    pub one_off_orders: usize,
    pub open_complaints: usize,
    pub total_users: usize,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
    pub recent_orders: Vec<Order>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

pub struct AdminService {
    orders: Arc<dyn OrderRepository>,
    complaints: Arc<dyn ComplaintRepository>,
    users: Arc<dyn UserRepository>,
}

impl AdminService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        complaints: Arc<dyn ComplaintRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            orders,
            complaints,
            users,
        }
    }

    pub async fn stats(&self) -> ServiceResult<AdminStats> {
        let orders = self.orders.list_orders(None).await?;
        let open_complaints = self
            .complaints
            .list_complaints()
            .await?
            .iter()
            .filter(|c| c.status == ComplaintStatus::Open)
            .count();
        let total_users = self.users.count_users().await?;

        let paid: Vec<&Order> = orders.iter().filter(|o| o.is_paid()).collect();
        let total_revenue = paid.iter().map(|o| o.total).sum();
        let active_subscriptions = paid
            .iter()
            .filter(|o| o.kind == BookingKind::Subscription)
            .count();
        let one_off_orders = orders
            .iter()
            .filter(|o| o.kind == BookingKind::OneOff)
            .count();

        Ok(AdminStats {
            total_orders: orders.len(),
            active_subscriptions,
            one_off_orders,
            open_complaints,
            total_users,
            total_revenue,
            monthly_revenue: monthly_revenue(&paid),
            recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
        })
    }

    /// All orders, newest first, optionally narrowed to one tracking status
    pub async fn list_orders(&self, status: Option<&str>) -> ServiceResult<Vec<Order>> {
        let filter = match status.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(label) => Some(OrderStatus::from_label(label).ok_or_else(|| {
                ServiceError::validation(format!("Unknown order status: {}", label))
            })?),
        };
        Ok(self.orders.list_orders(filter).await?)
    }
}

/// Paid revenue per calendar month, newest month first
fn monthly_revenue(paid: &[&Order]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    for order in paid {
        let entry = months
            .entry(order.created_at.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += order.total;
        entry.1 += 1;
    }
    months
        .into_iter()
        .rev()
        .take(REVENUE_MONTHS)
        .map(|(month, (revenue, count))| MonthlyRevenue {
            month,
            revenue,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::services::booking::{BookingService, CreateBookingRequest};
    use crate::models::PaymentStatus;
    use crate::pricing::AddonSelection;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn booking(kind: BookingKind) -> CreateBookingRequest {
        CreateBookingRequest {
            kind,
            plan_id: (kind == BookingKind::Subscription).then(|| "starter".to_string()),
            suburb: "Geelong".into(),
            pickup_date: Some("2030-01-15".into()),
            pickup_time_slot: Some("10:00 AM - 12:00 PM".into()),
            weight_kg: Some(Decimal::new(10, 0)),
            addons: vec![AddonSelection::new("folding", 1)],
            ..Default::default()
        }
    }

    async fn mark_paid(store: &InMemoryStore, mut order: Order, month: u32) {
        order.payment_status = PaymentStatus::Paid;
        order.created_at = Utc.with_ymd_and_hms(2026, month, 5, 9, 0, 0).unwrap();
        store.update_order(order).await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_aggregates_paid_orders() {
        let store = Arc::new(InMemoryStore::new());
        let bookings = BookingService::new(store.clone(), "https://freshfold.test/track");
        let admin = AdminService::new(store.clone(), store.clone(), store.clone());

        let one_off = bookings.create(None, booking(BookingKind::OneOff)).await.unwrap();
        let sub = bookings
            .create(None, booking(BookingKind::Subscription))
            .await
            .unwrap();
        bookings.create(None, booking(BookingKind::OneOff)).await.unwrap();

        mark_paid(&store, one_off.clone(), 9).await;
        mark_paid(&store, sub.clone(), 10).await;

        let stats = admin.stats().await.unwrap();
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.one_off_orders, 2);
        assert_eq!(stats.active_subscriptions, 1);
        assert_eq!(stats.total_revenue, one_off.total + sub.total);
        assert_eq!(stats.recent_orders.len(), 3);

        let months: Vec<&str> = stats.monthly_revenue.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2026-10", "2026-09"]);
        assert_eq!(stats.monthly_revenue[0].revenue, sub.total);
        assert_eq!(stats.monthly_revenue[1].count, 1);
    }

    #[tokio::test]
    async fn test_list_orders_filter() {
        let store = Arc::new(InMemoryStore::new());
        let bookings = BookingService::new(store.clone(), "https://freshfold.test/track");
        let admin = AdminService::new(store.clone(), store.clone(), store.clone());
        bookings.create(None, booking(BookingKind::OneOff)).await.unwrap();

        assert_eq!(admin.list_orders(None).await.unwrap().len(), 1);
        assert_eq!(admin.list_orders(Some("Order Placed")).await.unwrap().len(), 1);
        assert!(admin.list_orders(Some("Washing")).await.unwrap().is_empty());
        assert!(matches!(
            admin.list_orders(Some("Lost")).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
