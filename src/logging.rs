use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn rolling_appender(config: &AppConfig) -> RollingFileAppender {
    let rotation = match config.rotation.as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    };
    RollingFileAppender::new(rotation, &config.log_dir, &config.log_file)
}

/// File plus stdout logging for the gateway. Keep the guard alive until exit.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(rolling_appender(config));

    let filter_str = if config.enable_tracing {
        config.log_level.clone()
    } else {
        format!("{},tower_http=off", config.log_level)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

/// Stdout-only logging for the smoke runner.
///
/// Uses a `HH:MM:SS` timer so each step line reads like a console transcript.
pub fn init_console_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer()
        .with_target(false)
        .with_level(false)
        .with_timer(fmt::time::ChronoLocal::new("%H:%M:%S".to_string()));
    // try_init: integration tests may have installed a subscriber already
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
