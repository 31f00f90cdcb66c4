//! Subscription Error Types

use thiserror::Error;

use super::state::{SubscriptionAction, SubscriptionStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Cannot {action} a subscription that is {from}")]
    InvalidTransition {
        from: SubscriptionStatus,
        action: SubscriptionAction,
    },

    #[error("No active subscription")]
    NoLiveSubscription,

    #[error("You already have a {0} subscription")]
    AlreadySubscribed(SubscriptionStatus),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("planId is required for upgrade")]
    MissingPlan,
}

impl SubscriptionError {
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            SubscriptionError::NoLiveSubscription => "SUBSCRIPTION_NOT_FOUND",
            SubscriptionError::AlreadySubscribed(_) => "ALREADY_SUBSCRIBED",
            SubscriptionError::InvalidPlan(_) => "INVALID_PLAN",
            SubscriptionError::MissingPlan => "MISSING_PLAN",
        }
    }
}
