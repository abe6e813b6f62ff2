//! HTTP server.
//!
//! This module provides:
//! - The axum [`router`] with the simulation, health and metrics routes
//! - CORS restricted to the configured front-end origins
//! - [`serve`], which runs the router until ctrl-c
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/simulations/run` | run one simulation |
//! | `POST` | `/api/simulations/run` | legacy alias |
//! | `GET` | `/health` | configuration presence probe |
//! | `GET` | `/metrics` | per-mode simulation metrics |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use survey_simulator::config::Config;
//! use survey_simulator::generation::UnconfiguredGenerator;
//! use survey_simulator::server::{serve, AppState};
//!
//! # async fn example() -> std::io::Result<()> {
//! let config = Config::default();
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! let state = AppState::new(Arc::new(UnconfiguredGenerator::new("OPENAI_API_KEY")), config);
//! serve(listener, state).await
//! # }
//! ```

mod handlers;
mod state;

pub use handlers::HealthResponse;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Origins under this suffix are always allowed (hosted previews).
pub const PREVIEW_ORIGIN_SUFFIX: &str = ".lovableproject.com";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/simulations/run", post(handlers::run_simulation))
        .route("/api/simulations/run", post(handlers::run_simulation))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured allow-list plus hosted preview origins.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| origin_allowed(&allowed, origin),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// True for an exact allow-list match or a hosted preview origin.
#[must_use]
pub fn origin_allowed(allowed: &[HeaderValue], origin: &HeaderValue) -> bool {
    allowed.contains(origin)
        || origin
            .to_str()
            .is_ok_and(|o| o.ends_with(PREVIEW_ORIGIN_SUFFIX))
}

/// Serve the router on `listener` until ctrl-c.
///
/// # Errors
///
/// Returns the underlying I/O error if the server fails.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
