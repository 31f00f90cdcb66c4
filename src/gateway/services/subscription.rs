//! Subscription Service
//!
//! Applies [`SubscriptionStatus::apply`] and keeps the user's denormalized
//! subscription summary in sync.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::catalog::{self, PlanDef};
use crate::core_types::new_id;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Subscription, SubscriptionSummary, User};
use crate::store::{SubscriptionRepository, UserRepository};
use crate::subscription::{SubscriptionAction, SubscriptionError, SubscriptionStatus};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    #[schema(example = "family")]
    pub plan_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub action: SubscriptionAction,
    /// Target plan for `upgrade`
    #[serde(default)]
    pub plan_id: Option<String>,
}

pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            subscriptions,
            users,
        }
    }

    pub async fn subscribe(&self, user: &User, plan_id: &str) -> ServiceResult<Subscription> {
        let plan = find_plan(plan_id)?;

        if let Some(live) = self.subscriptions.get_live_subscription(user.id).await? {
            return Err(SubscriptionError::AlreadySubscribed(live.status).into());
        }

        let now = Utc::now();
        let mut sub = Subscription {
            id: new_id(),
            user_id: user.id,
            plan_id: String::new(),
            plan_name: String::new(),
            price: plan.price(),
            status: SubscriptionStatus::Active,
            pickups_used: 0,
            pickups_per_month: 0,
            max_weight_kg: 0,
            paused_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        apply_plan(&mut sub, plan);

        // A concurrent subscribe may win the slot between the check and here
        self.subscriptions
            .insert_subscription(sub.clone())
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    SubscriptionError::AlreadySubscribed(SubscriptionStatus::Active).into()
                } else {
                    ServiceError::from(e)
                }
            })?;
        self.sync_summary(user, Some(sub.summary())).await?;

        tracing::info!(user = %user.email, plan = plan.id, "Subscribed");
        Ok(sub)
    }

    /// The caller's active or paused subscription, if any
    pub async fn current(&self, user: &User) -> ServiceResult<Option<Subscription>> {
        Ok(self.subscriptions.get_live_subscription(user.id).await?)
    }

    pub async fn update(
        &self,
        user: &User,
        action: SubscriptionAction,
        plan_id: Option<&str>,
    ) -> ServiceResult<Subscription> {
        let mut sub = self
            .subscriptions
            .get_live_subscription(user.id)
            .await?
            .ok_or(SubscriptionError::NoLiveSubscription)?;

        let next = sub.status.apply(action)?;
        let now = Utc::now();

        match action {
            SubscriptionAction::Pause => sub.paused_at = Some(now),
            SubscriptionAction::Resume => sub.paused_at = None,
            SubscriptionAction::Cancel => sub.cancelled_at = Some(now),
            SubscriptionAction::Upgrade => {
                let plan_id = plan_id
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(SubscriptionError::MissingPlan)?;
                apply_plan(&mut sub, find_plan(plan_id)?);
            }
        }
        sub.status = next;
        sub.updated_at = now;

        self.subscriptions.update_subscription(sub.clone()).await?;
        let summary = sub.status.is_live().then(|| sub.summary());
        self.sync_summary(user, summary).await?;

        tracing::info!(
            user = %user.email,
            action = %action,
            status = %sub.status,
            "Subscription updated"
        );
        Ok(sub)
    }

    async fn sync_summary(
        &self,
        user: &User,
        summary: Option<SubscriptionSummary>,
    ) -> ServiceResult<()> {
        // Re-read so a concurrent role change is not overwritten
        let Some(mut fresh) = self.users.get_user(user.id).await? else {
            return Ok(());
        };
        fresh.subscription = summary;
        self.users.update_user(fresh).await?;
        Ok(())
    }
}

fn find_plan(plan_id: &str) -> Result<&'static PlanDef, SubscriptionError> {
    catalog::find_plan(plan_id.trim())
        .ok_or_else(|| SubscriptionError::InvalidPlan(plan_id.to_string()))
}

fn apply_plan(sub: &mut Subscription, plan: &PlanDef) {
    sub.plan_id = plan.id.to_string();
    sub.plan_name = plan.name.to_string();
    sub.price = plan.price();
    sub.pickups_per_month = plan.pickups_per_month;
    sub.max_weight_kg = plan.max_weight_kg;
}
