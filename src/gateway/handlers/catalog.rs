//! Catalog endpoints: static plan, add-on and suburb lists

use axum::Json;

use crate::catalog::{self, SERVICE_SUBURBS};
use crate::gateway::types::{AddonsResponse, PlansResponse, SuburbsResponse};

/// Subscription plans
#[utoipa::path(
    get,
    path = "/api/plans",
    responses((status = 200, description = "All plans", body = PlansResponse)),
    tag = "Catalog"
)]
pub async fn get_plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: catalog::plan_views(),
    })
}

/// Priced add-ons
#[utoipa::path(
    get,
    path = "/api/addons",
    responses((status = 200, description = "All add-ons", body = AddonsResponse)),
    tag = "Catalog"
)]
pub async fn get_addons() -> Json<AddonsResponse> {
    Json(AddonsResponse {
        addons: catalog::addon_views(),
    })
}

/// Serviceable suburbs
#[utoipa::path(
    get,
    path = "/api/suburbs",
    responses((status = 200, description = "Service area", body = SuburbsResponse)),
    tag = "Catalog"
)]
pub async fn get_suburbs() -> Json<SuburbsResponse> {
    Json(SuburbsResponse {
        suburbs: SERVICE_SUBURBS.iter().map(|s| s.to_string()).collect(),
    })
}
