//! Sliding-window rate limiter, keyed by client IP.

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::ApiError;
use crate::state::AppState;

pub struct RateLimiter {
    window: Duration,
    limit: u32,
    hits: DashMap<IpAddr, Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { window, limit, hits: DashMap::new() }
    }

    /// Records a request from `ip` and returns whether it's allowed.
    /// Prunes timestamps outside the window before counting, so old
    /// traffic never keeps a client penalized past the window.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let entry = self.hits.entry(ip).or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut timestamps = entry.lock();

        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() as u32 >= self.limit {
            return false;
        }

        timestamps.push_back(now);
        true
    }
}

/// Rejects with `429` when the connecting peer has exceeded its window.
/// Falls back to an unroutable address if the connection info is missing
/// (e.g. in tests that don't wire `into_make_service_with_connect_info`),
/// which means every such request shares one bucket rather than bypassing
/// the limiter entirely.
pub async fn rate_limit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = connect_info.map_or(IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| addr.ip());

    if !state.rate_limiter.check(ip) {
        state.metrics.rate_limit_rejections.inc();
        return Err(ApiError::new(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    #[tokio::test(start_paused = true)]
    async fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check(ip()));
        assert!(limiter.check(ip()));
        assert!(limiter.check(ip()));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_requests_over_the_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check(ip()));
        assert!(limiter.check(ip()));
        assert!(!limiter.check(ip()));
    }

    #[tokio::test(start_paused = true)]
    async fn resets_after_the_window_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(ip()));
        assert!(!limiter.check(ip()));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check(ip()));
    }

    #[tokio::test(start_paused = true)]
    async fn tracks_clients_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert!(limiter.check(ip()));
        assert!(limiter.check(other));
    }
}
