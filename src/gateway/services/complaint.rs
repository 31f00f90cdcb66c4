//! Complaint Service - ticketed complaints and admin follow-up

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core_types::{CODE_ALLOCATION_ATTEMPTS, new_id, new_ticket_number};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{AdminNote, Complaint, ComplaintStatus, User};
use crate::money::PositiveDecimal;
use crate::store::{ComplaintRepository, OrderRepository};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    #[schema(example = "quality")]
    pub category: String,
    #[serde(default)]
    #[schema(example = "Stain on my shirt was not removed")]
    pub description: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintRequest {
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 12.5)]
    pub refund_amount: Option<PositiveDecimal>,
    #[serde(default)]
    pub admin_note: Option<String>,
}

pub struct ComplaintService {
    complaints: Arc<dyn ComplaintRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl ComplaintService {
    pub fn new(complaints: Arc<dyn ComplaintRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { complaints, orders }
    }

    pub async fn create(
        &self,
        user: Option<&User>,
        req: CreateComplaintRequest,
    ) -> ServiceResult<Complaint> {
        if req.category.trim().is_empty() || req.description.trim().is_empty() {
            return Err(ServiceError::validation("Category and description required"));
        }

        let order_id = match req.order_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| ServiceError::not_found("Order not found"))?;
                if self.orders.get_order(id).await?.is_none() {
                    return Err(ServiceError::not_found("Order not found"));
                }
                Some(id)
            }
        };

        let now = Utc::now();
        let mut complaint = Complaint {
            id: new_id(),
            ticket_number: String::new(),
            order_id,
            user_id: user.map(|u| u.id),
            user_name: user
                .map(|u| u.name.clone())
                .or(req.guest_name)
                .unwrap_or_else(|| "Guest".to_string()),
            user_email: user
                .map(|u| u.email.clone())
                .or(req.guest_email)
                .unwrap_or_default(),
            category: req.category.trim().to_string(),
            description: req.description,
            photo_url: req.photo_url.filter(|s| !s.is_empty()),
            status: ComplaintStatus::Open,
            resolution: None,
            refund_amount: None,
            admin_notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        for attempt in 1..=CODE_ALLOCATION_ATTEMPTS {
            complaint.ticket_number = new_ticket_number();
            match self.complaints.insert_complaint(complaint.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        "[TRACE] Complaint {}: ✅ filed ({})",
                        complaint.ticket_number,
                        complaint.category
                    );
                    return Ok(complaint);
                }
                Err(e) if e.is_conflict() => {
                    tracing::warn!(attempt, "Ticket number collision: {}", complaint.ticket_number);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Internal(
            "Could not allocate a unique ticket number".into(),
        ))
    }

    /// Admins see every complaint, customers only their own
    pub async fn list(&self, user: &User) -> ServiceResult<Vec<Complaint>> {
        let complaints = if user.is_admin() {
            self.complaints.list_complaints().await?
        } else {
            self.complaints.list_complaints_for_user(user.id).await?
        };
        Ok(complaints)
    }

    pub async fn update(
        &self,
        admin: &User,
        complaint_id: &str,
        req: UpdateComplaintRequest,
    ) -> ServiceResult<Complaint> {
        let not_found = || ServiceError::not_found("Complaint not found");
        let id = Uuid::parse_str(complaint_id.trim()).map_err(|_| not_found())?;
        let mut complaint = self.complaints.get_complaint(id).await?.ok_or_else(not_found)?;
        let now = Utc::now();

        if let Some(status) = req.status {
            complaint.status = status;
        }
        if let Some(resolution) = req.resolution.filter(|r| !r.is_empty()) {
            complaint.resolution = Some(resolution);
        }
        if let Some(refund) = req.refund_amount {
            complaint.refund_amount = Some(refund.inner());
        }
        if let Some(note) = req.admin_note.filter(|n| !n.trim().is_empty()) {
            complaint.admin_notes.push(AdminNote {
                note,
                timestamp: now,
                admin: admin.name.clone(),
            });
        }
        complaint.updated_at = now;

        self.complaints.update_complaint(complaint.clone()).await?;
        Ok(complaint)
    }
}
