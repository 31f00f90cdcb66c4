//! Repository traits for data access abstraction
//!
//! Services receive these as `Arc<dyn ...>` so the backing store can be
//! swapped without touching business logic. Uniqueness (emails, tracking ids,
//! ticket numbers, one live subscription per user) is enforced here at insert
//! time; callers react to [`StoreError::Conflict`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::core_types::{ComplaintId, OrderId, UserId};
use crate::models::{Complaint, Order, OrderStatus, PaymentTransaction, Subscription, User};

pub use memory::InMemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; `Conflict` when the email is taken
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Lookup by lower-cased email
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Replace an existing user record
    async fn update_user(&self, user: User) -> StoreResult<()>;

    async fn count_users(&self) -> StoreResult<usize>;
}

// ============================================================================
// Order Repository
// ============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order; `Conflict` when the tracking id is taken
    async fn insert_order(&self, order: Order) -> StoreResult<()>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn get_order_by_tracking(&self, tracking_id: &str) -> StoreResult<Option<Order>>;

    /// Orders owned by a user, newest first
    async fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;

    /// All orders, newest first, optionally filtered by current status
    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>>;

    async fn update_order(&self, order: Order) -> StoreResult<()>;
}

// ============================================================================
// Subscription Repository
// ============================================================================

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a subscription; `Conflict` when the user already has a live one
    async fn insert_subscription(&self, sub: Subscription) -> StoreResult<()>;

    /// The user's active or paused subscription
    async fn get_live_subscription(&self, user_id: UserId) -> StoreResult<Option<Subscription>>;

    async fn update_subscription(&self, sub: Subscription) -> StoreResult<()>;
}

// ============================================================================
// Complaint Repository
// ============================================================================

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Insert a complaint; `Conflict` when the ticket number is taken
    async fn insert_complaint(&self, complaint: Complaint) -> StoreResult<()>;

    async fn get_complaint(&self, id: ComplaintId) -> StoreResult<Option<Complaint>>;

    /// Complaints filed by a user, newest first
    async fn list_complaints_for_user(&self, user_id: UserId) -> StoreResult<Vec<Complaint>>;

    async fn list_complaints(&self) -> StoreResult<Vec<Complaint>>;

    async fn update_complaint(&self, complaint: Complaint) -> StoreResult<()>;
}

// ============================================================================
// Payment Repository
// ============================================================================

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_transaction(&self, tx: PaymentTransaction) -> StoreResult<()>;

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> StoreResult<Option<PaymentTransaction>>;

    /// Replace a transaction; indexes its session id when one is set
    async fn update_transaction(&self, tx: PaymentTransaction) -> StoreResult<()>;
}
