//! hsq Request Queue Host - Main Entry Point
//! Owns (or joins) one HTTP.sys request queue until Ctrl+C

mod config;
mod service;
mod telemetry;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{DaemonConfig, LOG_FILE_PREFIX};
use crate::service::{select_driver, QueueHost};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FORMAT_ENV: &str = "HSQ_LOG_FORMAT";
const DEFAULT_LOG_FILTER: &str = "hsq=info";

/// Install the global subscriber
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            let dir = shellexpand::tilde(dir).into_owned();
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stdout), None),
    };

    let fmt_layer = match log_format.as_str() {
        // Production: JSON structured logging
        "json" => fmt::layer().json().with_writer(writer).boxed(),
        // Development: Pretty formatting with colors
        _ => fmt::layer().pretty().with_writer(writer).boxed(),
    };

    let telemetry_result = telemetry::layer();
    let (telemetry_layer, telemetry_error) = match telemetry_result {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(telemetry_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(e) = telemetry_error {
        warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (logging depends on it)
    let config = DaemonConfig::load()?;

    // 2. Initialize logging
    let _log_guard = init_logging(&config)?;
    info!("hsq request queue host v{} starting...", VERSION);
    info!(
        request_queue_name = ?config.queue_name(),
        mode = %config.mode,
        driver = ?config.driver,
        prefixes = ?config.url_prefixes,
        "Configuration loaded"
    );

    // 3. Pick the kernel HTTP stack
    let driver = select_driver(config.driver)?;

    // 4. Create the URL group and queue, start listening if we own it
    let host = QueueHost::start(driver, &config)?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Detach, then release the queue and the group
    host.shutdown();
    telemetry::shutdown();

    info!("Shutdown complete.");
    Ok(())
}
