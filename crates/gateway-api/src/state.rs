//! Shared application state. Built once at startup, cloned (cheaply,
//! behind `Arc`) into every request handler.

use std::sync::Arc;
use std::time::Duration;

use gateway_core::cache::TtlCache;
use gateway_core::config::GatewayConfig;
use gateway_core::metrics::Metrics;
use gateway_core::reliability::ReliabilityStore;
use gateway_providers::debrid::DebridRegistry;
use gateway_providers::traits::ProviderRegistry;
use tokio::sync::Semaphore;

use crate::middleware::rate_limit::RateLimiter;

/// A fully finalized listing response, as served from the final-response
/// cache or computed fresh.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedListing {
    pub body: serde_json::Value,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub providers: Arc<ProviderRegistry>,
    pub debrid: Arc<DebridRegistry>,
    pub reliability: Arc<ReliabilityStore>,
    pub metrics: Arc<Metrics>,
    pub final_response_cache: TtlCache<String, CachedListing>,
    pub provider_probe_cache: TtlCache<(String, String), bool>,
    pub concurrency_gate: Arc<Semaphore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        providers: ProviderRegistry,
        debrid: DebridRegistry,
    ) -> Self {
        let final_response_cache = TtlCache::new(
            config.cache.final_response_capacity,
            Duration::from_secs(config.cache.final_response_ttl_secs),
        );
        let provider_probe_cache = TtlCache::new(1_000, Duration::from_secs(config.cache.provider_probe_ttl_secs));
        let concurrency_gate = Arc::new(Semaphore::new(config.concurrency.max_in_flight));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.requests_per_window,
            Duration::from_secs(config.rate_limit.window_secs),
        ));

        Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            debrid: Arc::new(debrid),
            reliability: Arc::new(ReliabilityStore::new()),
            metrics: Arc::new(Metrics::new()),
            final_response_cache,
            provider_probe_cache,
            concurrency_gate,
            rate_limiter,
        }
    }
}
