//! Subscription lifecycle
//!
//! Pure state machine; persistence and plan switching live in
//! [`crate::gateway::services::subscription`].

pub mod error;
pub mod state;

pub use error::SubscriptionError;
pub use state::{SubscriptionAction, SubscriptionStatus};
