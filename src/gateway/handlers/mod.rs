//! HTTP handlers
//!
//! Thin adapters: extract, delegate to a service, wrap the result.

pub mod admin;
pub mod booking;
pub mod catalog;
pub mod checkout;
pub mod complaint;
pub mod health;
pub mod subscription;

// Glob re-exports keep the `#[utoipa::path]` companions reachable from `openapi.rs`
pub use admin::*;
pub use booking::*;
pub use catalog::*;
pub use checkout::*;
pub use complaint::*;
pub use health::*;
pub use subscription::*;
