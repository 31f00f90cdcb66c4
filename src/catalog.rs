//! Static service catalog: subscription plans, add-ons and the service area.
//!
//! Prices are held as `(mantissa, scale)` pairs so the tables stay `const` and
//! are turned into `Decimal` on access.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Per-kilogram rate for one-off bookings (5.99)
pub fn one_off_rate_per_kg() -> Decimal {
    Decimal::new(599, 2)
}

/// Goods-and-services tax rate (10%)
pub fn gst_rate() -> Decimal {
    Decimal::new(10, 2)
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct PlanDef {
    pub id: &'static str,
    pub name: &'static str,
    price_cents: i64,
    pub badge: Option<&'static str>,
    pub description: &'static str,
    pub features: &'static [&'static str],
    /// -1 means unlimited
    pub max_weight_kg: i32,
    pub pickups_per_month: u32,
}

impl PlanDef {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const PLANS: &[PlanDef] = &[
    PlanDef {
        id: "starter",
        name: "Starter",
        price_cents: 1999,
        badge: None,
        description: "Affordable, hassle-free laundry service for individuals who need reliable twice-monthly care.",
        features: &[
            "Up to 15 lbs (~7kg) per pickup",
            "2 pickups/month",
            "Standard wash & dry",
            "Folding included",
            "Real-time QR tracking",
            "Secure QR access",
        ],
        max_weight_kg: 7,
        pickups_per_month: 2,
    },
    PlanDef {
        id: "family",
        name: "Family",
        price_cents: 4999,
        badge: Some("Most Popular"),
        description: "Our most popular plan. Weekly convenience with ironing included and premium garment care.",
        features: &[
            "Up to 40 lbs (~18kg) per pickup",
            "Weekly pickups (4/month)",
            "Premium detergents",
            "Ironing & folding",
            "Real-time QR tracking",
            "Secure QR access",
            "Priority support",
            "Custom wash preferences",
        ],
        max_weight_kg: 18,
        pickups_per_month: 4,
    },
    PlanDef {
        id: "premium",
        name: "Premium",
        price_cents: 8999,
        badge: Some("Ultimate"),
        description: "Ultimate garment care with unlimited volume and priority handling.",
        features: &[
            "Unlimited weight",
            "Twice-weekly pickups (8/month)",
            "Luxury detergents",
            "Full ironing service",
            "Delicate care",
            "Real-time QR tracking",
            "Secure QR access",
            "24/7 priority support",
            "Same-day service",
        ],
        max_weight_kg: -1,
        pickups_per_month: 8,
    },
];

pub fn find_plan(id: &str) -> Option<&'static PlanDef> {
    PLANS.iter().find(|p| p.id == id)
}

// ============================================================================
// Add-ons
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct AddonDef {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    price_cents: i64,
}

impl AddonDef {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const ADDONS: &[AddonDef] = &[
    AddonDef { id: "ironing", name: "Extra Ironing Service", unit: "per bag", price_cents: 1499 },
    AddonDef { id: "folding", name: "Folding-Only Service", unit: "per bag", price_cents: 799 },
    AddonDef { id: "softener", name: "Fabric Softener", unit: "per wash", price_cents: 299 },
    AddonDef { id: "hypoallergenic", name: "Hypoallergenic Detergent", unit: "per wash", price_cents: 499 },
    AddonDef { id: "stain", name: "Heavy Stain Treatment", unit: "per item", price_cents: 599 },
    AddonDef { id: "express", name: "Express Same-Day Service", unit: "per order", price_cents: 1099 },
];

pub fn find_addon(id: &str) -> Option<&'static AddonDef> {
    ADDONS.iter().find(|a| a.id == id)
}

// ============================================================================
// Service area
// ============================================================================

pub const SERVICE_SUBURBS: &[&str] = &[
    "Geelong", "Geelong West", "Newtown", "Highton", "Belmont", "Grovedale", "Waurn Ponds",
    "Corio", "Norlane", "North Geelong", "South Geelong", "Drumcondra", "Herne Hill",
    "Manifold Heights", "Breakwater", "East Geelong", "Thomson", "Whittington",
    "St Albans Park", "Newcomb", "Moolap", "Leopold", "Wallington", "Ocean Grove",
    "Barwon Heads", "Torquay", "Jan Juc", "Bells Beach", "Anglesea", "Lorne",
    "Point Lonsdale", "Queenscliff", "Portarlington", "Drysdale", "Clifton Springs",
    "Indented Head", "St Leonards", "Lara", "Little River", "Anakie", "Lovely Banks",
    "Batesford", "Fyansford", "Stonehaven", "Armstrong Creek", "Mount Duneed",
    "Charlemont", "Marshall", "Connewarre", "Freshwater Creek",
];

/// Resolve a client-supplied suburb to its canonical spelling.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn serviceable_suburb(suburb: &str) -> Option<&'static str> {
    let wanted = suburb.trim();
    if wanted.is_empty() {
        return None;
    }
    SERVICE_SUBURBS
        .iter()
        .copied()
        .find(|s| s.eq_ignore_ascii_case(wanted))
}

// ============================================================================
// Catalog DTOs (GET /plans, /addons)
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 49.99)]
    pub price: Decimal,
    pub badge: Option<String>,
    pub description: String,
    pub features: Vec<String>,
    pub max_weight_kg: i32,
    pub pickups_per_month: u32,
}

impl From<&PlanDef> for PlanView {
    fn from(p: &PlanDef) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.to_string(),
            price: p.price(),
            badge: p.badge.map(str::to_string),
            description: p.description.to_string(),
            features: p.features.iter().map(|f| f.to_string()).collect(),
            max_weight_kg: p.max_weight_kg,
            pickups_per_month: p.pickups_per_month,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddonView {
    pub id: String,
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 14.99)]
    pub price: Decimal,
}

impl From<&AddonDef> for AddonView {
    fn from(a: &AddonDef) -> Self {
        Self {
            id: a.id.to_string(),
            name: a.name.to_string(),
            unit: a.unit.to_string(),
            price: a.price(),
        }
    }
}

pub fn plan_views() -> Vec<PlanView> {
    PLANS.iter().map(PlanView::from).collect()
}

pub fn addon_views() -> Vec<AddonView> {
    ADDONS.iter().map(AddonView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let plan_ids: HashSet<_> = PLANS.iter().map(|p| p.id).collect();
        assert_eq!(plan_ids.len(), PLANS.len());
        let addon_ids: HashSet<_> = ADDONS.iter().map(|a| a.id).collect();
        assert_eq!(addon_ids.len(), ADDONS.len());
        let suburbs: HashSet<_> = SERVICE_SUBURBS.iter().collect();
        assert_eq!(suburbs.len(), SERVICE_SUBURBS.len());
    }

    #[test]
    fn test_prices() {
        assert_eq!(find_addon("ironing").unwrap().price().to_string(), "14.99");
        assert_eq!(find_addon("softener").unwrap().price().to_string(), "2.99");
        assert_eq!(find_plan("family").unwrap().price().to_string(), "49.99");
        assert_eq!(one_off_rate_per_kg().to_string(), "5.99");
        assert_eq!(gst_rate().to_string(), "0.10");
        assert!(find_addon("gold-leaf").is_none());
        assert!(find_plan("enterprise").is_none());
    }

    #[test]
    fn test_serviceable_suburb_is_case_insensitive() {
        assert_eq!(serviceable_suburb("Geelong"), Some("Geelong"));
        assert_eq!(serviceable_suburb("  geelong west "), Some("Geelong West"));
        assert_eq!(serviceable_suburb("TORQUAY"), Some("Torquay"));
        assert_eq!(serviceable_suburb("InvalidSuburb"), None);
        assert_eq!(serviceable_suburb(""), None);
        assert_eq!(serviceable_suburb("Melbourne"), None);
    }

    #[test]
    fn test_plan_view_serializes_numbers() {
        let json = serde_json::to_value(PlanView::from(find_plan("starter").unwrap())).unwrap();
        assert_eq!(json["price"], serde_json::json!(19.99));
        assert_eq!(json["maxWeightKg"], 7);
        assert_eq!(json["pickupsPerMonth"], 2);
    }
}
