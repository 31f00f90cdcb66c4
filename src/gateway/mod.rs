pub mod handlers;
pub mod openapi;
pub mod services;
pub mod state;
pub mod types;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, GatewayConfig};
use crate::user_auth::{self, middleware as auth_mw};
use state::AppState;

/// Build the complete router: `/api/*`, Swagger UI at `/docs`, JSON 404 fallback
pub fn build_router(state: Arc<AppState>, config: &GatewayConfig) -> Router {
    // ==========================================================================
    // Public Routes (no auth required)
    // ==========================================================================
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(user_auth::handlers::register))
        .route("/auth/login", post(user_auth::handlers::login))
        .route("/plans", get(handlers::get_plans))
        .route("/addons", get(handlers::get_addons))
        .route("/suburbs", get(handlers::get_suburbs))
        .route("/tracking/{tracking_id}", get(handlers::track_order))
        .route("/checkout/session", post(handlers::create_checkout_session))
        .route(
            "/checkout/status/{session_id}",
            get(handlers::checkout_status),
        );

    // ==========================================================================
    // Guest-or-user Routes: a valid token attaches the caller
    // ==========================================================================
    let optional_routes = Router::new()
        .route("/bookings", post(handlers::create_booking))
        .route("/complaints", post(handlers::create_complaint))
        .layer(from_fn_with_state(
            state.clone(),
            auth_mw::optional_auth_middleware,
        ));

    // ==========================================================================
    // User Routes - Protected by JWT
    // ==========================================================================
    let user_routes = Router::new()
        .route("/auth/me", get(user_auth::handlers::me))
        .route("/auth/make-admin", post(user_auth::handlers::make_admin))
        .route("/bookings", get(handlers::list_bookings))
        .route("/bookings/{id}", get(handlers::get_booking))
        .route(
            "/subscriptions",
            get(handlers::get_subscription)
                .post(handlers::subscribe)
                .put(handlers::update_subscription),
        )
        .route("/complaints", get(handlers::list_complaints))
        .layer(from_fn_with_state(
            state.clone(),
            auth_mw::jwt_auth_middleware,
        ));

    // ==========================================================================
    // Admin Routes - JWT, then role check
    // ==========================================================================
    let admin_routes = Router::new()
        .route("/bookings/{id}", put(handlers::update_booking))
        .route("/bookings/status/{id}", put(handlers::update_booking))
        .route("/complaints/{id}", put(handlers::update_complaint))
        .route("/admin/stats", get(handlers::admin_stats))
        .route("/admin/orders", get(handlers::list_admin_orders))
        .route("/admin/orders/{id}", put(handlers::update_booking))
        .route("/admin/complaints", get(handlers::list_admin_complaints))
        .route("/admin/complaints/{id}", put(handlers::update_complaint))
        // Layers run outermost-last: jwt resolves the caller before the role check
        .layer(from_fn(auth_mw::admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            auth_mw::jwt_auth_middleware,
        ));

    let api = Router::new()
        .merge(public_routes)
        .merge(optional_routes)
        .merge(user_routes)
        .merge(admin_routes);

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api/openapi.json", openapi::ApiDoc::openapi()))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// `*` or an empty list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(methods)
        .allow_headers(headers)
}

/// Start HTTP Gateway server
pub async fn run_server(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state, &config.gateway);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.gateway.port
        )
    })?;

    println!("🚀 Gateway listening on http://{}", addr);
    println!("📖 API Docs: http://{}/docs", addr);
    println!("📂 API:      /api/*");
    tracing::info!(%addr, "Gateway started");

    axum::serve(listener, app).await?;
    Ok(())
}
