//! Fresh Fold - Laundry Booking API
//!
//! Reference gateway the smoke runner is pointed at:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Router  │───▶│ Services │───▶│  Store   │
//! │  (YAML)  │    │ (/api/*) │    │(pricing) │    │(in-mem)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;

use clap::Parser;

use fresh_fold::config::AppConfig;
use fresh_fold::gateway::{self, state::AppState};
use fresh_fold::logging::init_logging;
use fresh_fold::payment;
use fresh_fold::store::InMemoryStore;

#[derive(Parser, Debug)]
#[command(name = "fresh_fold", version, about = "Fresh Fold booking API gateway")]
struct Args {
    /// Config environment, loaded from config/<env>.yaml
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// Override gateway.port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut app_config = AppConfig::load(&args.env)?;
    if let Some(port) = args.port {
        app_config.gateway.port = port;
    }
    let _log_guard = init_logging(&app_config);

    tracing::info!(
        "Starting Fresh Fold API {} ({}) in {} mode",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        args.env
    );
    println!("=== Fresh Fold API ===");

    let store = Arc::new(InMemoryStore::new());
    let payments = payment::from_config(&app_config.payment);
    if app_config.payment.enabled {
        println!("Payment gateway: {}", app_config.payment.api_base);
    } else {
        println!("Payment gateway: disabled (checkout falls back to manual payment)");
    }

    let state = Arc::new(AppState::new(&app_config, store, payments));
    gateway::run_server(&app_config, state).await
}
