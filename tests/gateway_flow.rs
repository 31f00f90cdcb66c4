//! Boots the reference gateway on an ephemeral port and drives it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use fresh_fold::config::AppConfig;
use fresh_fold::gateway::{build_router, state::AppState};
use fresh_fold::payment::{DisabledGateway, MockGateway, PaymentGateway};
use fresh_fold::smoke::{STEP_NAMES, SmokeOptions, SmokeRunner};
use fresh_fold::store::InMemoryStore;

const ADMIN_EMAIL: &str = "ops@freshfold.test";
const ADMIN_PASSWORD: &str = "OpsPass123!";

fn test_config() -> AppConfig {
    let yaml = format!(
        r#"
log_level: warn
log_dir: ./logs
log_file: test.log
use_json: false
rotation: never
enable_tracing: false
gateway:
  host: 127.0.0.1
  port: 0
  public_base_url: http://freshfold.test
auth:
  jwt_secret: integration-secret
  token_ttl_hours: 1
  bootstrap_admins:
    - {}
"#,
        ADMIN_EMAIL
    );
    AppConfig::from_yaml(&yaml).unwrap()
}

async fn spawn_gateway(payments: Arc<dyn PaymentGateway>) -> SocketAddr {
    let config = test_config();
    let state = Arc::new(AppState::new(
        &config,
        Arc::new(InMemoryStore::new()),
        payments,
    ));
    let app = build_router(state, &config.gateway);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn options(addr: SocketAddr) -> SmokeOptions {
    SmokeOptions {
        base_url: format!("http://{}/api", addr),
        origin_url: format!("http://{}", addr),
        timeout: Duration::from_secs(10),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    }
}

async fn register(client: &reqwest::Client, addr: SocketAddr, email: &str) -> String {
    let resp = client
        .post(format!("http://{}/api/auth/register", addr))
        .json(&json!({ "name": "Flow Tester", "email": email, "password": "FlowPass123!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_smoke_run_passes_with_gateway_outage() {
    let addr = spawn_gateway(Arc::new(DisabledGateway)).await;

    let report = SmokeRunner::new(options(addr)).unwrap().run().await;

    assert_eq!(report.total(), STEP_NAMES.len());
    assert!(report.all_passed(), "failures:\n{}", report);
    assert_eq!(report.success_rate(), 100.0);
}

#[tokio::test]
async fn test_smoke_run_passes_with_payment_session() {
    let addr = spawn_gateway(Arc::new(MockGateway::new())).await;

    let report = SmokeRunner::new(options(addr)).unwrap().run().await;

    assert!(report.all_passed(), "failures:\n{}", report);
}

#[tokio::test]
async fn test_make_admin_fails_without_credentials() {
    let addr = spawn_gateway(Arc::new(DisabledGateway)).await;
    let mut opts = options(addr);
    opts.admin_email = None;
    opts.admin_password = None;

    let report = SmokeRunner::new(opts).unwrap().run().await;

    let failed: Vec<&str> = report.failures().map(|s| s.name).collect();
    // admin_stats depends on the promotion
    assert_eq!(failed, vec!["make_admin", "admin_stats"]);
}

#[tokio::test]
async fn test_error_shapes() {
    let addr = spawn_gateway(Arc::new(DisabledGateway)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/api/bookings", addr))
        .json(&json!({
            "type": "one-off",
            "suburb": "Melbourne",
            "pickupDate": "2030-01-15",
            "pickupTimeSlot": "10:00 AM - 12:00 PM",
            "weightKg": 5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert!(body["error"].as_str().unwrap().starts_with("Service not available"));

    let resp = client
        .get(format!("http://{}/api/bookings", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let token = register(&client, addr, "plain@freshfold.test").await;
    let resp = client
        .get(format!("http://{}/api/admin/stats", addr))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .get(format!("http://{}/api/nowhere", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["path"], "/api/nowhere");
}

#[tokio::test]
async fn test_checkout_settles_order_when_paid() {
    let gateway = Arc::new(MockGateway::new());
    let addr = spawn_gateway(gateway.clone()).await;
    let client = reqwest::Client::new();
    let token = register(&client, addr, "payer@freshfold.test").await;

    let resp = client
        .post(format!("http://{}/api/bookings", addr))
        .bearer_auth(&token)
        .json(&json!({
            "type": "one-off",
            "suburb": "Torquay",
            "pickupDate": "2030-01-15",
            "pickupTimeSlot": "2:00 PM - 4:00 PM",
            "weightKg": 6,
            "addons": [{ "id": "express" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("http://{}/api/checkout/session", addr))
        .json(&json!({ "orderId": order_id, "originUrl": "http://freshfold.test/checkout" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert!(body["url"].as_str().unwrap().contains(&session_id));

    assert!(gateway.mark_paid(&session_id));
    let resp = client
        .get(format!("http://{}/api/checkout/status/{}", addr, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["payment_status"], "paid");

    let resp = client
        .get(format!("http://{}/api/bookings/{}", addr, order_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order"]["paymentStatus"], "paid");

    let resp = client
        .post(format!("http://{}/api/checkout/session", addr))
        .json(&json!({ "orderId": order_id, "originUrl": "http://freshfold.test/checkout" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}
