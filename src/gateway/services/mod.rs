//! Gateway Services Layer
//!
//! Business logic behind the HTTP handlers. Each service receives the store
//! traits it needs; handlers are thin adapters that delegate here.

pub mod admin;
pub mod booking;
pub mod checkout;
pub mod complaint;
pub mod subscription;

pub use admin::{AdminService, AdminStats, MonthlyRevenue};
pub use booking::{BookingService, CreateBookingRequest, TrackingView, UpdateOrderRequest};
pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService, CheckoutStatus};
pub use complaint::{ComplaintService, CreateComplaintRequest, UpdateComplaintRequest};
pub use subscription::{SubscribeRequest, SubscriptionService, UpdateSubscriptionRequest};
