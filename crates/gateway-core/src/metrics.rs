//! Prometheus metrics, exposed at `GET /metrics`.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub candidates_fetched: IntCounterVec,
    pub candidates_dropped: IntCounterVec,
    pub candidates_scored: IntCounter,
    pub cache_hits: IntCounterVec,
    pub cache_misses: IntCounterVec,
    pub debrid_outcomes: IntCounterVec,
    pub rate_limit_rejections: IntCounter,
}

impl Metrics {
    /// Builds a fresh registry with every counter registered. Panics only
    /// if two metrics are registered under the same name, which would be a
    /// programming error caught immediately at startup.
    #[must_use]
    pub fn new() -> Self {
        let registry = Registry::new();

        let candidates_fetched = IntCounterVec::new(
            Opts::new("gateway_candidates_fetched_total", "Candidates returned by a provider"),
            &["origin"],
        )
        .expect("valid metric");
        let candidates_dropped = IntCounterVec::new(
            Opts::new("gateway_candidates_dropped_total", "Candidates removed by a filter stage"),
            &["stage"],
        )
        .expect("valid metric");
        let candidates_scored =
            IntCounter::new("gateway_candidates_scored_total", "Candidates that reached the scorer")
                .expect("valid metric");
        let cache_hits = IntCounterVec::new(
            Opts::new("gateway_cache_hits_total", "Cache hits by logical cache name"),
            &["cache"],
        )
        .expect("valid metric");
        let cache_misses = IntCounterVec::new(
            Opts::new("gateway_cache_misses_total", "Cache misses by logical cache name"),
            &["cache"],
        )
        .expect("valid metric");
        let debrid_outcomes = IntCounterVec::new(
            Opts::new("gateway_debrid_outcomes_total", "Debrid resolution outcomes by provider and result"),
            &["provider", "outcome"],
        )
        .expect("valid metric");
        let rate_limit_rejections = IntCounter::new(
            "gateway_rate_limit_rejections_total",
            "Requests rejected by the sliding-window rate limiter",
        )
        .expect("valid metric");

        registry.register(Box::new(candidates_fetched.clone())).expect("register metric");
        registry.register(Box::new(candidates_dropped.clone())).expect("register metric");
        registry.register(Box::new(candidates_scored.clone())).expect("register metric");
        registry.register(Box::new(cache_hits.clone())).expect("register metric");
        registry.register(Box::new(cache_misses.clone())).expect("register metric");
        registry.register(Box::new(debrid_outcomes.clone())).expect("register metric");
        registry.register(Box::new(rate_limit_rejections.clone())).expect("register metric");

        Self {
            registry,
            candidates_fetched,
            candidates_dropped,
            candidates_scored,
            cache_hits,
            cache_misses,
            debrid_outcomes,
            rate_limit_rejections,
        }
    }

    /// Render the current state in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_registered_metric_names() {
        let metrics = Metrics::new();
        metrics.candidates_fetched.with_label_values(&["torrent_index_a"]).inc();
        metrics.rate_limit_rejections.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("gateway_candidates_fetched_total"));
        assert!(text.contains("gateway_rate_limit_rejections_total"));
    }
}
