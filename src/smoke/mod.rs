//! End-to-end smoke runner
//!
//! Drives a deployed Fresh Fold API through the customer and admin journeys,
//! one step at a time, and reports PASS/FAIL per step.
//!
//! ```text
//! health ─▶ register ─▶ login ─▶ me ─▶ catalog ─▶ booking ─▶ tracking
//!        ─▶ subscription ─▶ complaints ─▶ make-admin ─▶ stats ─▶ checkout
//! ```

pub mod client;
pub mod report;
pub mod runner;

pub use client::{ApiClient, ApiReply};
pub use report::{SmokeError, SmokeReport, StepResult};
pub use runner::{SmokeOptions, SmokeRunner, STEP_NAMES};
