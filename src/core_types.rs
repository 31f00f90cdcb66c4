//! Core types used throughout the system
//!
//! Entity ids are UUID v4. Customer-facing codes (tracking ids, ticket
//! numbers) are short prefixed hex strings; the store rejects duplicates so
//! callers re-draw on collision.

use uuid::Uuid;

/// User ID - primary key for user accounts
pub type UserId = Uuid;

/// Order ID - internal id, never shown on the tracking page
pub type OrderId = Uuid;

pub type SubscriptionId = Uuid;

pub type ComplaintId = Uuid;

pub type TransactionId = Uuid;

pub const TRACKING_PREFIX: &str = "FF-";

pub const TICKET_PREFIX: &str = "TKT-";

/// How many times a service re-draws a code after a uniqueness conflict
pub const CODE_ALLOCATION_ATTEMPTS: usize = 5;

/// `FF-` followed by 8 uppercase hex characters
pub fn new_tracking_id() -> String {
    prefixed_code(TRACKING_PREFIX)
}

/// `TKT-` followed by 8 uppercase hex characters
pub fn new_ticket_number() -> String {
    prefixed_code(TICKET_PREFIX)
}

fn prefixed_code(prefix: &str) -> String {
    let id_bytes: [u8; 4] = rand::random();
    format!("{}{}", prefix, hex::encode(id_bytes).to_uppercase())
}

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_id_format() {
        let id = new_tracking_id();
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("FF-"));
        assert!(
            id[3..]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_ticket_number_format() {
        let t = new_ticket_number();
        assert_eq!(t.len(), 12);
        assert!(t.starts_with("TKT-"));
    }

    #[test]
    fn test_codes_vary() {
        let a: Vec<String> = (0..32).map(|_| new_tracking_id()).collect();
        let unique: std::collections::HashSet<_> = a.iter().collect();
        assert!(unique.len() > 1);
    }
}
