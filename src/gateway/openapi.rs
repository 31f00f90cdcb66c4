//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3000/docs`
//! - OpenAPI JSON: `http://localhost:3000/api/openapi.json`

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::catalog::{AddonView, PlanView};
use crate::error::ErrorBody;
use crate::gateway::services::{
    AdminStats, CheckoutOutcome, CheckoutRequest, CheckoutStatus, CreateBookingRequest,
    CreateComplaintRequest, MonthlyRevenue, SubscribeRequest, TrackingView,
    UpdateComplaintRequest, UpdateOrderRequest, UpdateSubscriptionRequest,
};
use crate::gateway::types::{
    AddonsResponse, ComplaintEnvelope, ComplaintsEnvelope, HealthResponse, MakeAdminRequest,
    MessageResponse, NotFoundBody, OrderEnvelope, OrdersEnvelope, PlansResponse,
    SubscriptionEnvelope, SuburbsResponse, UserEnvelope,
};
use crate::models::{
    AdminNote, Complaint, ComplaintStatus, Order, OrderStatus, PaymentStatus, Role, StatusEntry,
    Subscription, SubscriptionSummary, User,
};
use crate::pricing::{AddonSelection, BookingKind, PricedAddon};
use crate::subscription::{SubscriptionAction, SubscriptionStatus};
use crate::user_auth::{AuthResponse, LoginRequest, RegisterRequest};

/// JWT bearer security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fresh Fold API",
        version = "1.0.0",
        description = "Laundry pickup booking: pricing, tracking, subscriptions, complaints and checkout.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        // Auth
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::user_auth::handlers::me,
        crate::user_auth::handlers::make_admin,
        // Catalog
        crate::gateway::handlers::get_plans,
        crate::gateway::handlers::get_addons,
        crate::gateway::handlers::get_suburbs,
        // Bookings
        crate::gateway::handlers::create_booking,
        crate::gateway::handlers::list_bookings,
        crate::gateway::handlers::get_booking,
        crate::gateway::handlers::update_booking,
        crate::gateway::handlers::track_order,
        // Subscriptions
        crate::gateway::handlers::subscribe,
        crate::gateway::handlers::get_subscription,
        crate::gateway::handlers::update_subscription,
        // Complaints
        crate::gateway::handlers::create_complaint,
        crate::gateway::handlers::list_complaints,
        crate::gateway::handlers::update_complaint,
        // Admin
        crate::gateway::handlers::admin_stats,
        crate::gateway::handlers::list_admin_orders,
        crate::gateway::handlers::list_admin_complaints,
        // Checkout
        crate::gateway::handlers::create_checkout_session,
        crate::gateway::handlers::checkout_status,
    ),
    components(
        schemas(
            ErrorBody,
            NotFoundBody,
            HealthResponse,
            MessageResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            MakeAdminRequest,
            User,
            Role,
            UserEnvelope,
            SubscriptionSummary,
            PlanView,
            AddonView,
            PlansResponse,
            AddonsResponse,
            SuburbsResponse,
            BookingKind,
            AddonSelection,
            PricedAddon,
            CreateBookingRequest,
            UpdateOrderRequest,
            Order,
            OrderStatus,
            StatusEntry,
            PaymentStatus,
            OrderEnvelope,
            OrdersEnvelope,
            TrackingView,
            SubscribeRequest,
            UpdateSubscriptionRequest,
            Subscription,
            SubscriptionStatus,
            SubscriptionAction,
            SubscriptionEnvelope,
            CreateComplaintRequest,
            UpdateComplaintRequest,
            Complaint,
            ComplaintStatus,
            AdminNote,
            ComplaintEnvelope,
            ComplaintsEnvelope,
            AdminStats,
            MonthlyRevenue,
            CheckoutRequest,
            CheckoutOutcome,
            CheckoutStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "Registration, login and roles"),
        (name = "Catalog", description = "Plans, add-ons and service area (no auth required)"),
        (name = "Bookings", description = "Booking creation and tracking"),
        (name = "Subscriptions", description = "Recurring plan lifecycle (auth required)"),
        (name = "Complaints", description = "Ticketed complaints"),
        (name = "Admin", description = "Reporting and order management (admin only)"),
        (name = "Checkout", description = "Payment sessions")
    )
)]
pub struct ApiDoc;
