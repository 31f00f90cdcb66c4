//! Booking pricing and validation
//!
//! The single place where a booking request is accepted or rejected and where
//! its total is computed. Both the gateway and the smoke runner price through
//! [`price_booking`], so the server and the client verifier can never disagree
//! on the formula.
//!
//! ```text
//! base      = weightKg * 5.99              (one-off)
//!           | plan.price                   (subscription)
//! subtotal  = base + Σ addon.price * qty
//! gst       = subtotal * 0.10
//! total     = round_half_up(subtotal + gst, 2)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::{self, PlanDef};
use crate::money::{self, MoneyError};

/// Weights are accepted to the gram
pub const MAX_WEIGHT_DECIMALS: u32 = 3;

pub const SERVICE_UNAVAILABLE_MSG: &str = "Service not available in this suburb. We serve Greater Geelong, Bellarine Peninsula, and Surf Coast areas.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("{}", SERVICE_UNAVAILABLE_MSG)]
    ServiceUnavailable,

    #[error("{0}")]
    Validation(String),
}

/// Booking type, serialized the way clients send it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BookingKind {
    #[default]
    OneOff,
    Subscription,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::OneOff => "one-off",
            BookingKind::Subscription => "subscription",
        }
    }
}

/// Requested add-on line; quantity defaults to 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddonSelection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl AddonSelection {
    pub fn new(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            quantity: Some(quantity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PricingRequest<'a> {
    pub kind: BookingKind,
    pub plan_id: Option<&'a str>,
    pub suburb: &'a str,
    pub weight_kg: Option<Decimal>,
    pub addons: &'a [AddonSelection],
}

impl<'a> PricingRequest<'a> {
    pub fn one_off(suburb: &'a str, weight_kg: Decimal, addons: &'a [AddonSelection]) -> Self {
        Self {
            kind: BookingKind::OneOff,
            plan_id: None,
            suburb,
            weight_kg: Some(weight_kg),
            addons,
        }
    }
}

/// Priced add-on line as stored on the order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricedAddon {
    pub id: String,
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
}

/// Accepted booking with its price breakdown
#[derive(Debug, Clone)]
pub struct Quote {
    /// Canonical spelling from the service area list
    pub suburb: &'static str,
    pub plan: Option<&'static PlanDef>,
    pub weight_kg: Option<Decimal>,
    pub base_cost: Decimal,
    pub addons: Vec<PricedAddon>,
    pub addons_total: Decimal,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub total: Decimal,
}

/// Validate and price a booking.
///
/// Checks run in this order: service area, base price (weight or plan),
/// add-on lines. The first failure wins.
pub fn price_booking(req: &PricingRequest<'_>) -> Result<Quote, PricingError> {
    // 1. Service area
    let suburb = catalog::serviceable_suburb(req.suburb).ok_or(PricingError::ServiceUnavailable)?;

    // 2. Base price
    let (plan, weight_kg, base_cost) = match req.kind {
        BookingKind::Subscription => {
            let plan_id = req.plan_id.ok_or_else(|| {
                PricingError::Validation("planId is required for subscription bookings".into())
            })?;
            let plan = catalog::find_plan(plan_id)
                .ok_or_else(|| PricingError::Validation("Invalid plan".into()))?;
            let weight = req.weight_kg.map(validate_weight).transpose()?;
            (Some(plan), weight, plan.price())
        }
        BookingKind::OneOff => {
            let weight = req
                .weight_kg
                .ok_or_else(|| PricingError::Validation("weightKg is required".into()))
                .and_then(validate_weight)?;
            let base = weight
                .checked_mul(catalog::one_off_rate_per_kg())
                .ok_or_else(overflow)?;
            (None, Some(weight), base)
        }
    };

    // 3. Add-ons
    let addons = req
        .addons
        .iter()
        .map(price_addon)
        .collect::<Result<Vec<_>, _>>()?;
    let addons_total = addons
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.subtotal))
        .ok_or_else(overflow)?;

    // 4. Tax and total
    let subtotal = base_cost.checked_add(addons_total).ok_or_else(overflow)?;
    let gst = subtotal.checked_mul(catalog::gst_rate()).ok_or_else(overflow)?;
    let total = money::round_cents(subtotal.checked_add(gst).ok_or_else(overflow)?);

    Ok(Quote {
        suburb,
        plan,
        weight_kg,
        base_cost,
        addons,
        addons_total,
        subtotal,
        gst,
        total,
    })
}

fn validate_weight(weight: Decimal) -> Result<Decimal, PricingError> {
    money::check_positive(weight, MAX_WEIGHT_DECIMALS).map_err(|e| match e {
        MoneyError::PrecisionOverflow { max, .. } => PricingError::Validation(format!(
            "weightKg supports at most {} decimal places",
            max
        )),
        _ => PricingError::Validation("weightKg must be greater than zero".into()),
    })
}

/// Totals beyond `Decimal` range are rejected, not wrapped
fn overflow() -> PricingError {
    PricingError::Validation("Booking total is out of range".into())
}

fn price_addon(sel: &AddonSelection) -> Result<PricedAddon, PricingError> {
    let def = catalog::find_addon(sel.id.trim())
        .ok_or_else(|| PricingError::Validation(format!("Unknown add-on: {}", sel.id)))?;
    let quantity = sel.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(PricingError::Validation(format!(
            "Add-on {} quantity must be at least 1",
            def.id
        )));
    }
    let price = def.price();
    Ok(PricedAddon {
        id: def.id.to_string(),
        name: def.name.to_string(),
        unit: def.unit.to_string(),
        price,
        quantity,
        subtotal: price.checked_mul(Decimal::from(quantity)).ok_or_else(overflow)?,
    })
}
