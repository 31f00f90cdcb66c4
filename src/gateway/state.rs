use std::sync::Arc;

use crate::config::AppConfig;
use crate::payment::PaymentGateway;
use crate::store::{
    ComplaintRepository, OrderRepository, PaymentRepository, SubscriptionRepository,
    UserRepository,
};
use crate::user_auth::UserAuthService;

use super::services::{
    AdminService, BookingService, CheckoutService, ComplaintService, SubscriptionService,
};

/// Gateway application state (shared across handlers)
pub struct AppState {
    pub user_auth: Arc<UserAuthService>,
    pub bookings: Arc<BookingService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub complaints: Arc<ComplaintService>,
    pub admin: Arc<AdminService>,
    pub checkout: Arc<CheckoutService>,
}

impl AppState {
    /// Wire every service to one store.
    ///
    /// The store is shared; each service only sees the repositories it needs.
    pub fn new<S>(config: &AppConfig, store: Arc<S>, payments: Arc<dyn PaymentGateway>) -> Self
    where
        S: UserRepository
            + OrderRepository
            + SubscriptionRepository
            + ComplaintRepository
            + PaymentRepository
            + 'static,
    {
        Self {
            user_auth: Arc::new(UserAuthService::new(store.clone(), &config.auth)),
            bookings: Arc::new(BookingService::new(
                store.clone(),
                &config.gateway.public_base_url,
            )),
            subscriptions: Arc::new(SubscriptionService::new(store.clone(), store.clone())),
            complaints: Arc::new(ComplaintService::new(store.clone(), store.clone())),
            admin: Arc::new(AdminService::new(store.clone(), store.clone(), store.clone())),
            checkout: Arc::new(CheckoutService::new(
                store.clone(),
                store,
                payments,
                &config.payment.currency,
            )),
        }
    }
}
