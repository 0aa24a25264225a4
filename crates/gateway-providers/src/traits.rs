//! Shared provider contract: one capability, one mandatory async method,
//! never fails the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_core::model::{CandidateStream, Origin};

/// What the request is asking for, independent of any single upstream's
/// wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Movie,
    Series,
}

#[derive(Debug, Clone)]
pub struct ContentQuery {
    pub kind: ContentKind,
    pub imdb_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Attached only when the direct-host indexer requires it for this
    /// request; never logged, never defaulted.
    pub cookie: Option<String>,
}

/// A catalog provider: torrent indexer A, torrent indexer B, or the
/// direct-host indexer. Never returns `Err` to the orchestrator; internal
/// failures are logged and folded into an empty list.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    fn origin(&self) -> Origin;

    async fn fetch(&self, query: &ContentQuery, deadline: Duration) -> Vec<CandidateStream>;
}

/// Maps an origin tag to its boxed provider so the orchestrator can
/// enable/disable sources per request (`only=torrentio|tpb|nuvio`)
/// without `if`-chains.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Origin, Arc<dyn StreamProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    pub fn register(&mut self, provider: Arc<dyn StreamProvider>) {
        self.providers.insert(provider.origin(), provider);
    }

    #[must_use]
    pub fn get(&self, origin: Origin) -> Option<Arc<dyn StreamProvider>> {
        self.providers.get(&origin).cloned()
    }

    /// Every registered provider whose origin is in `enabled` (or every
    /// registered provider, if `enabled` is `None`).
    #[must_use]
    pub fn enabled(&self, enabled: Option<&[Origin]>) -> Vec<Arc<dyn StreamProvider>> {
        match enabled {
            None => self.providers.values().cloned().collect(),
            Some(origins) => origins.iter().filter_map(|o| self.providers.get(o).cloned()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider(Origin);

    #[async_trait]
    impl StreamProvider for StubProvider {
        fn origin(&self) -> Origin {
            self.0
        }

        async fn fetch(&self, _query: &ContentQuery, _deadline: Duration) -> Vec<CandidateStream> {
            Vec::new()
        }
    }

    #[test]
    fn registry_looks_up_by_origin() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider(Origin::TorrentIndexA)));
        assert!(registry.get(Origin::TorrentIndexA).is_some());
        assert!(registry.get(Origin::DirectHost).is_none());
    }

    #[test]
    fn enabled_filters_to_requested_origins() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider(Origin::TorrentIndexA)));
        registry.register(Arc::new(StubProvider(Origin::TorrentIndexB)));
        let only = registry.enabled(Some(&[Origin::TorrentIndexB]));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].origin(), Origin::TorrentIndexB);
    }
}
