//! Payment gateway integration
//!
//! Checkout sessions are created through a [`PaymentGateway`]. The real
//! implementation talks to a Stripe-compatible REST API; the disabled and mock
//! gateways serve local runs and tests.

pub mod error;
pub mod gateway;

pub use error::PaymentError;
pub use gateway::{
    CheckoutSession, DisabledGateway, MockGateway, PaymentGateway, SessionRequest, StripeGateway,
    from_config,
};
