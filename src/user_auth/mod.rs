//! User accounts and bearer-token authentication
//!
//! - [`service`]: registration, login, JWT issue/verify, role assignment
//! - [`middleware`]: axum layers that resolve the caller from the token
//! - [`handlers`]: `/api/auth/*` endpoints

pub mod handlers;
pub mod middleware;
pub mod service;

pub use middleware::AuthUser;
pub use service::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserAuthService};
