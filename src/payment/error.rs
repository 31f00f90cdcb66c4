//! Payment gateway errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment gateway is not configured")]
    Disabled,

    #[error("Payment gateway request failed: {0}")]
    Transport(String),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}
