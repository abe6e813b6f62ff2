//! Survey Simulator binary entry point.
//!
//! Loads configuration from the environment (and `.env`), builds the
//! provider-backed generator, and serves HTTP until ctrl-c. Logs go to
//! stderr.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use survey_simulator::config::Config;
use survey_simulator::generation::generator_from_config;
use survey_simulator::server::{serve, AppState};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    // Load configuration before logging so LOG_LEVEL from .env applies
    let config = Config::from_env();
    let log_level = config
        .as_ref()
        .map_or_else(|_| "info".to_string(), |c| c.log_level.clone());

    tracing_subscriber::fmt()
        .with_env_filter(
            log_level
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("survey-simulator starting...");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Configuration loaded: bind={}, credentials={}, batch_size={}",
        config.bind_addr(),
        config.has_credentials(),
        config.batch.size
    );

    let generator = match generator_from_config(&config) {
        Ok(generator) => generator,
        Err(e) => {
            tracing::error!("Provider setup error: {e}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(listener, AppState::new(generator, config)).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("survey-simulator shutdown complete");
}
