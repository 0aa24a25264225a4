//! Global concurrency gate: bounds simultaneously in-flight
//! listing computations. Requests that can't acquire a permit within
//! `queue_dwell_timeout` are rejected rather than queued indefinitely.

use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn concurrency_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let dwell = Duration::from_millis(state.config.concurrency.queue_dwell_timeout_ms);

    let permit = tokio::time::timeout(dwell, state.concurrency_gate.clone().acquire_owned())
        .await
        .map_err(|_| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "server is busy, try again shortly"))?
        .expect("semaphore is never closed");

    let response = next.run(request).await;
    drop(permit);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use gateway_core::config::GatewayConfig;
    use gateway_providers::debrid::DebridRegistry;
    use gateway_providers::traits::ProviderRegistry;
    use tower::ServiceExt;

    fn test_state(max_in_flight: usize, dwell_ms: u64) -> AppState {
        let mut config = GatewayConfig::default();
        config.concurrency.max_in_flight = max_in_flight;
        config.concurrency.queue_dwell_timeout_ms = dwell_ms;
        AppState::new(config, ProviderRegistry::new(), DebridRegistry::new())
    }

    async fn slow_handler() -> &'static str {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "ok"
    }

    #[tokio::test]
    async fn rejects_when_the_gate_is_saturated() {
        let state = test_state(1, 10);
        let app = Router::new()
            .route("/", get(slow_handler))
            .layer(axum::middleware::from_fn_with_state(state.clone(), concurrency_gate))
            .with_state(state);

        let app2 = app.clone();
        let first = tokio::spawn(async move {
            app2.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap()
        });
        tokio::time::sleep(Duration::from_millis(5)).await;

        let second = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);

        let first = first.await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
    }
}
