//! Fresh Fold - Laundry Booking API
//!
//! Pricing core, a reference HTTP gateway, and an end-to-end smoke runner.
//!
//! # Modules
//!
//! - [`catalog`] - Plans, add-ons and the service area
//! - [`pricing`] - Booking quotes (base + add-ons + GST + surcharge)
//! - [`subscription`] - Subscription lifecycle state machine
//! - [`models`] - Users, orders, complaints, transactions
//! - [`store`] - Repository traits and the in-memory store
//! - [`user_auth`] - Registration, login, JWT and admin checks
//! - [`payment`] - Hosted checkout gateway client
//! - [`gateway`] - axum router, handlers and OpenAPI
//! - [`smoke`] - Sequential API smoke test

// Core types - must be first!
pub mod core_types;
pub mod money;

pub mod catalog;
pub mod models;
pub mod pricing;
pub mod subscription;

pub mod config;
pub mod error;
pub mod logging;

pub mod gateway;
pub mod payment;
pub mod smoke;
pub mod store;
pub mod user_auth;

// Convenient re-exports at crate root
pub use error::{ServiceError, ServiceResult};
pub use money::PositiveDecimal;
pub use pricing::{AddonSelection, BookingKind, PricingError, PricingRequest, Quote, price_booking};
pub use store::InMemoryStore;
