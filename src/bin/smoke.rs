//! End-to-end smoke run against a live Fresh Fold API
//!
//! Usage:
//!   cargo run --bin smoke
//!   cargo run --bin smoke -- --base-url https://staging.freshfold.example/api
//!
//! Exits non-zero when any step fails.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use fresh_fold::config::{AppConfig, SmokeConfig};
use fresh_fold::logging::init_console_logging;
use fresh_fold::smoke::{SmokeOptions, SmokeRunner};

#[derive(Parser, Debug)]
#[command(name = "smoke", version, about = "Fresh Fold API smoke test")]
struct Args {
    /// Config environment whose `smoke` section supplies defaults
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// API root, including the `/api` prefix
    #[arg(long)]
    base_url: Option<String>,

    /// Return page passed to checkout
    #[arg(long)]
    origin_url: Option<String>,

    /// Existing admin used to promote the test user
    #[arg(long)]
    admin_email: Option<String>,

    #[arg(long)]
    admin_password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_console_logging(&args.log_level);

    // A missing config file is fine, the flags and defaults cover it
    let smoke_config = match AppConfig::load(&args.env) {
        Ok(config) => config.smoke,
        Err(e) => {
            tracing::warn!("Using default smoke settings: {:#}", e);
            SmokeConfig::default()
        }
    };

    let mut options = SmokeOptions::from_config(&smoke_config);
    if let Some(base_url) = args.base_url {
        options.base_url = base_url;
    }
    if let Some(origin_url) = args.origin_url {
        options.origin_url = origin_url;
    }
    if let Some(secs) = args.timeout {
        options.timeout = Duration::from_secs(secs.max(1));
    }
    if args.admin_email.is_some() {
        options.admin_email = args.admin_email;
    }
    if args.admin_password.is_some() {
        options.admin_password = args.admin_password;
    }

    let runner = match SmokeRunner::new(options) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("❌ Could not build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = runner.run().await;
    println!("\n{}", report);

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
