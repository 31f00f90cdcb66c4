//! In-memory store backed by `DashMap`.
//!
//! Secondary indexes (email, tracking id, ticket number, live subscription per
//! user, session id) are claimed through the entry API before the record is
//! written, so two concurrent inserts with the same key cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{
    ComplaintRepository, OrderRepository, PaymentRepository, StoreError, StoreResult,
    SubscriptionRepository, UserRepository,
};
use crate::core_types::{ComplaintId, OrderId, SubscriptionId, TransactionId, UserId};
use crate::models::{Complaint, Order, OrderStatus, PaymentTransaction, Subscription, User};

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<UserId, User>,
    users_by_email: DashMap<String, UserId>,

    orders: DashMap<OrderId, Order>,
    orders_by_tracking: DashMap<String, OrderId>,

    subscriptions: DashMap<SubscriptionId, Subscription>,
    live_subscription_by_user: DashMap<UserId, SubscriptionId>,

    complaints: DashMap<ComplaintId, Complaint>,
    complaints_by_ticket: DashMap<String, ComplaintId>,

    transactions: DashMap<TransactionId, PaymentTransaction>,
    transactions_by_session: DashMap<String, TransactionId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &'static str, key: impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        key: key.to_string(),
    }
}

fn conflict(entity: &'static str, key: impl ToString) -> StoreError {
    StoreError::Conflict {
        entity,
        key: key.to_string(),
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        match self.users_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(conflict("user", &user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.users_by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn update_user(&self, user: User) -> StoreResult<()> {
        let mut slot = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| not_found("user", user.id))?;
        *slot = user;
        Ok(())
    }

    async fn count_users(&self) -> StoreResult<usize> {
        Ok(self.users.len())
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        match self.orders_by_tracking.entry(order.tracking_id.clone()) {
            Entry::Occupied(_) => Err(conflict("order", &order.tracking_id)),
            Entry::Vacant(slot) => {
                slot.insert(order.id);
                self.orders.insert(order.id, order);
                Ok(())
            }
        }
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn get_order_by_tracking(&self, tracking_id: &str) -> StoreResult<Option<Order>> {
        let Some(id) = self.orders_by_tracking.get(tracking_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .map(|o| o.clone())
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .map(|o| o.clone())
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn update_order(&self, order: Order) -> StoreResult<()> {
        let mut slot = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| not_found("order", order.id))?;
        *slot = order;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn insert_subscription(&self, sub: Subscription) -> StoreResult<()> {
        match self.live_subscription_by_user.entry(sub.user_id) {
            Entry::Occupied(_) => Err(conflict("subscription", sub.user_id)),
            Entry::Vacant(slot) => {
                if sub.status.is_live() {
                    slot.insert(sub.id);
                }
                self.subscriptions.insert(sub.id, sub);
                Ok(())
            }
        }
    }

    async fn get_live_subscription(&self, user_id: UserId) -> StoreResult<Option<Subscription>> {
        let Some(id) = self.live_subscription_by_user.get(&user_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.subscriptions.get(&id).map(|s| s.clone()))
    }

    async fn update_subscription(&self, sub: Subscription) -> StoreResult<()> {
        let (id, user_id, terminal) = (sub.id, sub.user_id, sub.status.is_terminal());
        // Release the record guard before touching the index: inserts lock index then record
        {
            let mut slot = self
                .subscriptions
                .get_mut(&id)
                .ok_or_else(|| not_found("subscription", id))?;
            *slot = sub;
        }
        if terminal {
            self.live_subscription_by_user
                .remove_if(&user_id, |_, live| *live == id);
        }
        Ok(())
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryStore {
    async fn insert_complaint(&self, complaint: Complaint) -> StoreResult<()> {
        match self.complaints_by_ticket.entry(complaint.ticket_number.clone()) {
            Entry::Occupied(_) => Err(conflict("complaint", &complaint.ticket_number)),
            Entry::Vacant(slot) => {
                slot.insert(complaint.id);
                self.complaints.insert(complaint.id, complaint);
                Ok(())
            }
        }
    }

    async fn get_complaint(&self, id: ComplaintId) -> StoreResult<Option<Complaint>> {
        Ok(self.complaints.get(&id).map(|c| c.clone()))
    }

    async fn list_complaints_for_user(&self, user_id: UserId) -> StoreResult<Vec<Complaint>> {
        let complaints: Vec<Complaint> = self
            .complaints
            .iter()
            .filter(|c| c.user_id == Some(user_id))
            .map(|c| c.clone())
            .collect();
        Ok(newest_first(complaints, |c: &Complaint| c.created_at))
    }

    async fn list_complaints(&self) -> StoreResult<Vec<Complaint>> {
        let complaints: Vec<Complaint> = self.complaints.iter().map(|c| c.clone()).collect();
        Ok(newest_first(complaints, |c: &Complaint| c.created_at))
    }

    async fn update_complaint(&self, complaint: Complaint) -> StoreResult<()> {
        let mut slot = self
            .complaints
            .get_mut(&complaint.id)
            .ok_or_else(|| not_found("complaint", complaint.id))?;
        *slot = complaint;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert_transaction(&self, tx: PaymentTransaction) -> StoreResult<()> {
        if let Some(session_id) = &tx.session_id {
            self.transactions_by_session.insert(session_id.clone(), tx.id);
        }
        self.transactions.insert(tx.id, tx);
        Ok(())
    }

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> StoreResult<Option<PaymentTransaction>> {
        let Some(id) = self.transactions_by_session.get(session_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.transactions.get(&id).map(|t| t.clone()))
    }

    async fn update_transaction(&self, tx: PaymentTransaction) -> StoreResult<()> {
        let (id, session_id) = (tx.id, tx.session_id.clone());
        {
            let mut slot = self
                .transactions
                .get_mut(&id)
                .ok_or_else(|| not_found("transaction", id))?;
            *slot = tx;
        }
        if let Some(session_id) = session_id {
            self.transactions_by_session.insert(session_id, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, Role};
    use crate::pricing::BookingKind;
    use crate::subscription::SubscriptionStatus;
    use std::sync::Arc;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: email.into(),
            password_hash: String::new(),
            phone: String::new(),
            suburb: String::new(),
            role: Role::Customer,
            subscription: None,
            created_at: Utc::now(),
        }
    }

    fn subscription(user_id: UserId) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id: "family".into(),
            plan_name: "Family".into(),
            price: Decimal::new(4999, 2),
            status: SubscriptionStatus::Active,
            pickups_used: 0,
            pickups_per_month: 4,
            max_weight_kg: 18,
            paused_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn complaint(ticket: &str, user_id: Option<UserId>, age_secs: i64) -> Complaint {
        let at = Utc::now() - Duration::seconds(age_secs);
        Complaint {
            id: Uuid::new_v4(),
            ticket_number: ticket.into(),
            order_id: None,
            user_id,
            user_name: "Test".into(),
            user_email: "t@example.com".into(),
            category: "quality".into(),
            description: "Stain not removed".into(),
            photo_url: None,
            status: Default::default(),
            resolution: None,
            refund_amount: None,
            admin_notes: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.insert_user(user("a@example.com")).await.unwrap();
        let err = store.insert_user(user("a@example.com")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_lookup_and_update() {
        let store = InMemoryStore::new();
        let mut u = user("b@example.com");
        store.insert_user(u.clone()).await.unwrap();

        u.role = Role::Admin;
        store.update_user(u.clone()).await.unwrap();
        let found = store.get_user_by_email("b@example.com").await.unwrap().unwrap();
        assert!(found.is_admin());
        assert!(store.get_user_by_email("nobody@example.com").await.unwrap().is_none());

        let ghost = user("ghost@example.com");
        assert!(matches!(
            store.update_user(ghost).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_ticket_rejected() {
        let store = InMemoryStore::new();
        store
            .insert_complaint(complaint("TKT-00000001", None, 0))
            .await
            .unwrap();
        let err = store
            .insert_complaint(complaint("TKT-00000001", None, 0))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.list_complaints().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complaints_newest_first_and_scoped() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .insert_complaint(complaint("TKT-OLD", Some(owner), 60))
            .await
            .unwrap();
        store
            .insert_complaint(complaint("TKT-NEW", Some(owner), 0))
            .await
            .unwrap();
        store
            .insert_complaint(complaint("TKT-OTHER", Some(Uuid::new_v4()), 0))
            .await
            .unwrap();

        let mine = store.list_complaints_for_user(owner).await.unwrap();
        let tickets: Vec<_> = mine.iter().map(|c| c.ticket_number.as_str()).collect();
        assert_eq!(tickets, vec!["TKT-NEW", "TKT-OLD"]);
    }

    #[tokio::test]
    async fn test_one_live_subscription_per_user() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();
        let mut first = subscription(user_id);
        store.insert_subscription(first.clone()).await.unwrap();
        assert!(
            store
                .insert_subscription(subscription(user_id))
                .await
                .unwrap_err()
                .is_conflict()
        );

        // Cancelling frees the slot
        first.status = SubscriptionStatus::Cancelled;
        store.update_subscription(first).await.unwrap();
        assert!(store.get_live_subscription(user_id).await.unwrap().is_none());
        store.insert_subscription(subscription(user_id)).await.unwrap();
        assert!(store.get_live_subscription(user_id).await.unwrap().is_some());
    }

    fn order(tracking_id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            tracking_id: tracking_id.into(),
            user_id: None,
            guest_email: None,
            guest_name: None,
            guest_phone: None,
            kind: BookingKind::OneOff,
            plan_id: None,
            plan_name: "One-off Wash & Fold".into(),
            suburb: "Geelong".into(),
            pickup_date: now.date_naive(),
            pickup_time_slot: "10:00 AM - 12:00 PM".into(),
            delivery_preference: "standard".into(),
            items: 0,
            weight_kg: Some(Decimal::new(5, 0)),
            instructions: String::new(),
            addons: Vec::new(),
            base_cost: Decimal::new(2995, 2),
            addons_total: Decimal::ZERO,
            subtotal: Decimal::new(2995, 2),
            gst: Decimal::new(2995, 3),
            total: Decimal::new(3295, 2),
            status: OrderStatus::OrderPlaced,
            status_history: Vec::new(),
            payment_status: PaymentStatus::Pending,
            qr_code: String::new(),
            tracking_url: String::new(),
            items_confirmed: false,
            confirmed_items: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_tracking_id_rejected() {
        let store = InMemoryStore::new();
        let first = order("FF-0000BEEF");
        store.insert_order(first.clone()).await.unwrap();

        let err = store.insert_order(order("FF-0000BEEF")).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                entity: "order",
                key: "FF-0000BEEF".into()
            }
        );
        assert_eq!(store.list_orders(None).await.unwrap().len(), 1);
        let found = store.get_order_by_tracking("FF-0000BEEF").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_and_cancel_complete() {
        let store = Arc::new(InMemoryStore::new());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..500 {
                    let mut sub = subscription(Uuid::new_v4());
                    store.insert_subscription(sub.clone()).await.unwrap();
                    sub.status = SubscriptionStatus::Cancelled;
                    store.update_subscription(sub).await.unwrap();
                }
            }));
        }

        let all = join_all(tasks);
        tokio::time::timeout(std::time::Duration::from_secs(30), all)
            .await
            .expect("subscription writers stalled");
        assert!(store.live_subscription_by_user.is_empty());
        assert_eq!(store.subscriptions.len(), 8 * 500);
    }

    async fn join_all(tasks: Vec<tokio::task::JoinHandle<()>>) {
        for task in tasks {
            task.await.unwrap();
        }
    }
}
