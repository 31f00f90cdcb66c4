//! Subscription FSM State Definitions
//!
//! ```text
//!   active ──pause──▶ paused
//!     ▲                 │
//!     └─────resume──────┘
//!   active | paused ──cancel──▶ cancelled (terminal)
//! ```
//!
//! `upgrade` swaps the plan and keeps the state; it is not a state transition.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::SubscriptionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    /// Terminal
    Cancelled,
}

impl SubscriptionStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled)
    }

    /// Active or paused: counts as the user's current subscription
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Compute the state after `action`.
    ///
    /// `Upgrade` is accepted from any live state and leaves the state unchanged.
    pub fn apply(self, action: SubscriptionAction) -> Result<Self, SubscriptionError> {
        use SubscriptionAction::*;
        use SubscriptionStatus::*;

        match (self, action) {
            (Active, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Active),
            (Active | Paused, Cancel) => Ok(Cancelled),
            (Active | Paused, Upgrade) => Ok(self),
            (from, action) => Err(SubscriptionError::InvalidTransition { from, action }),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    Pause,
    Resume,
    Cancel,
    Upgrade,
}

impl SubscriptionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionAction::Pause => "pause",
            SubscriptionAction::Resume => "resume",
            SubscriptionAction::Cancel => "cancel",
            SubscriptionAction::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for SubscriptionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
