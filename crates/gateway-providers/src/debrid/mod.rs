//! Debrid resolver subsystem: five providers behind one
//! `DebridResolver` trait, a shared file/link cache layer, shared
//! season-pack detection, and a shared polling/finalization helper.

pub mod alldebrid;
pub mod cache;
pub mod finalize;
pub mod http_errors;
pub mod offcloud;
pub mod poll;
pub mod premiumize;
pub mod realdebrid;
pub mod season_pack;
pub mod torbox;
pub mod traits;

pub use alldebrid::AllDebridResolver;
pub use offcloud::OffcloudResolver;
pub use premiumize::PremiumizeResolver;
pub use realdebrid::RealDebridResolver;
pub use torbox::TorBoxResolver;
pub use traits::{DebridError, DebridResolver, ResolveOptions, ResolveTarget, SeriesMeta};

use std::collections::HashMap;
use std::sync::Arc;

/// Maps a provider tag (`AD`, `RD`, `PM`, `TB`, `OC`) to its resolver, so
/// the orchestrator and play redirect can dispatch on whichever query key
/// the caller supplied.
#[derive(Clone, Default)]
pub struct DebridRegistry {
    resolvers: HashMap<&'static str, Arc<dyn DebridResolver>>,
}

impl DebridRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { resolvers: HashMap::new() }
    }

    pub fn register(&mut self, resolver: Arc<dyn DebridResolver>) {
        self.resolvers.insert(resolver.tag(), resolver);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn DebridResolver>> {
        self.resolvers.get(tag).cloned()
    }
}
