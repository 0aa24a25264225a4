pub mod health;
pub mod manifest;
pub mod metrics;
pub mod play;
pub mod reliability;
pub mod stream;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::concurrency::concurrency_gate;
use crate::middleware::rate_limit::rate_limit;
use crate::state::AppState;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// Assembles the full router: routes plus the protective envelope -
/// tracing, CORS, a hard request timeout, panic recovery, the concurrency
/// gate, and the rate limiter - layered onto the router as nested
/// `tower` middleware.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/manifest.json", get(manifest::manifest))
        .route("/stream/:kind/:id", get(stream::stream_typed))
        .route("/stream/:id", get(stream::stream_compat))
        .route("/play", get(play::play))
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/ping", get(health::ping))
        .route("/metrics", get(metrics::metrics))
        .route("/reliability/stats", get(reliability::stats))
        .route("/reliability/penalties", get(reliability::penalties))
        .route("/reliability/clear", post(reliability::clear))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(axum::middleware::from_fn_with_state(state.clone(), concurrency_gate))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
