//! Money Module
//!
//! All currency arithmetic is done in `rust_decimal::Decimal` and rounded to the
//! currency's minor unit (cents) only where a value leaves the pricing core.
//!
//! ## Rounding
//! Totals use round-half-up (midpoint away from zero): `75.7845 -> 75.78`,
//! `0.125 -> 0.13`. Intermediate lines (base, subtotal, tax) stay exact.
//!
//! ## Usage
//! ```rust
//! use fresh_fold::money::{parse_amount, round_cents};
//!
//! let weight = parse_amount("8.5", 3).unwrap();
//! assert_eq!(round_cents(weight * parse_amount("5.99", 2).unwrap()).to_string(), "50.92");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minor unit of AUD
pub const CENT_DECIMALS: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Client → Decimal
// ============================================================================

/// Parse a client-supplied positive amount with at most `max_decimals` places.
///
/// Rejects `.5`, `5.`, signs, scientific notation and zero.
pub fn parse_amount(amount_str: &str, max_decimals: u32) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }
    if amount_str.starts_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing leading zero (e.g., use 0.5 instead of .5)".into(),
        ));
    }
    if amount_str.ends_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
        ));
    }
    if amount_str.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }

    let value = Decimal::from_str(amount_str)
        .map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;
    check_positive(value, max_decimals)
}

/// Validate an already-parsed Decimal: strictly positive, bounded scale.
pub fn check_positive(value: Decimal, max_decimals: u32) -> Result<Decimal, MoneyError> {
    if value.is_sign_negative() || value.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }
    // 8.50 has scale 2 but only one significant decimal
    let normalized = value.normalize();
    if normalized.scale() > max_decimals {
        return Err(MoneyError::PrecisionOverflow {
            provided: normalized.scale(),
            max: max_decimals,
        });
    }
    Ok(normalized)
}

// ============================================================================
// Rounding / Formatting
// ============================================================================

/// Round to cents, half-up.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Format as a fixed two-decimal string (`75.8` -> `"75.80"`).
pub fn format_cents(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

/// Lossy conversion for JSON consumers that compare with a float tolerance.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

// ============================================================================
// PositiveDecimal: validated at the Serde layer
// ============================================================================

/// Positive decimal accepted as a JSON number or string.
///
/// Format rules are the same as [`parse_amount`]; the scale limit is applied by
/// the caller since it differs between weights and prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveDecimal(Decimal);

impl PositiveDecimal {
    pub fn inner(self) -> Decimal {
        self.0
    }

    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() || value.is_zero() {
            return Err(MoneyError::InvalidAmount);
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for PositiveDecimal {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PositiveDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // Support both JSON number and JSON string
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        match DecimalOrString::deserialize(deserializer)? {
            DecimalOrString::String(s) => parse_amount(&s, 28)
                .map(PositiveDecimal)
                .map_err(D::Error::custom),
            DecimalOrString::Number(d) => PositiveDecimal::new(d).map_err(D::Error::custom),
        }
    }
}

impl Serialize for PositiveDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(parse_amount("8.5", 3).unwrap(), d("8.5"));
        assert_eq!(parse_amount("  12 ", 3).unwrap(), d("12"));
        assert_eq!(parse_amount("0.125", 3).unwrap(), d("0.125"));
    }

    #[test]
    fn test_parse_amount_rejects_bad_formats() {
        assert!(matches!(parse_amount("", 2), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(parse_amount(".5", 2), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(parse_amount("5.", 2), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(parse_amount("1e3", 2), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(parse_amount("abc", 2), Err(MoneyError::InvalidFormat(_))));
        assert_eq!(parse_amount("-1", 2), Err(MoneyError::InvalidAmount));
        assert_eq!(parse_amount("+1", 2), Err(MoneyError::InvalidAmount));
        assert_eq!(parse_amount("0", 2), Err(MoneyError::InvalidAmount));
    }

    #[test]
    fn test_precision_overflow_ignores_trailing_zeros() {
        assert_eq!(check_positive(d("8.500"), 1).unwrap(), d("8.5"));
        assert_eq!(
            parse_amount("1.2345", 3),
            Err(MoneyError::PrecisionOverflow {
                provided: 4,
                max: 3
            })
        );
    }

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(d("75.7845")), d("75.78"));
        assert_eq!(round_cents(d("0.125")), d("0.13"));
        assert_eq!(round_cents(d("0.135")), d("0.14"));
        assert_eq!(round_cents(d("50.915")), d("50.92"));
        assert_eq!(round_cents(d("10")), d("10"));
    }

    #[test]
    fn test_format_cents_pads() {
        assert_eq!(format_cents(d("75.8")), "75.80");
        assert_eq!(format_cents(d("0")), "0.00");
        assert_eq!(format_cents(d("19.994")), "19.99");
    }

    #[test]
    fn test_positive_decimal_from_number_and_string() {
        let n: PositiveDecimal = serde_json::from_str("8.5").unwrap();
        assert_eq!(*n, d("8.5"));
        let s: PositiveDecimal = serde_json::from_str(r#""8.5""#).unwrap();
        assert_eq!(*s, d("8.5"));
        let i: PositiveDecimal = serde_json::from_str("5").unwrap();
        assert_eq!(*i, d("5"));
    }

    #[test]
    fn test_positive_decimal_rejects_non_positive() {
        assert!(serde_json::from_str::<PositiveDecimal>("0").is_err());
        assert!(serde_json::from_str::<PositiveDecimal>("-2.5").is_err());
        assert!(serde_json::from_str::<PositiveDecimal>(r#""-2.5""#).is_err());
        assert!(serde_json::from_str::<PositiveDecimal>(r#"".5""#).is_err());
    }

    #[test]
    fn test_positive_decimal_serializes_as_number() {
        let v = PositiveDecimal::new(d("8.5")).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "8.5");
    }
}
