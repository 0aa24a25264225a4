//! Uniform debrid resolver contract.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// What to hand the provider: a bare info hash or a full magnet URI.
#[derive(Debug, Clone)]
pub enum ResolveTarget {
    InfoHash(String),
    Magnet(String),
}

impl ResolveTarget {
    #[must_use]
    pub fn info_hash(&self) -> &str {
        match self {
            Self::InfoHash(hash) => hash,
            Self::Magnet(magnet) => magnet
                .split("btih:")
                .nth(1)
                .and_then(|rest| rest.split(['&', '/']).next())
                .unwrap_or(magnet),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesMeta {
    pub season: u32,
    pub episode: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub file_index: Option<u32>,
    pub series: Option<SeriesMeta>,
}

/// Failure taxonomy. Every variant resolves to `Ok(None)` at the
/// call site in the orchestrator — resolvers never propagate these as HTTP
/// errors, they only annotate *why* a candidate produced no direct URL.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DebridError {
    #[error("authentication invalid")]
    AuthInvalid,
    #[error("provider rate limited")]
    RateLimited,
    #[error("transient failure")]
    Transient,
    #[error("no server available for this key")]
    NoServer,
    #[error("no files available")]
    NoFiles,
    #[error("resolution timed out")]
    Timeout,
}

impl DebridError {
    /// Whether retrying the same call with the same key could ever help.
    /// `auth_invalid` never will; the others might on a later request.
    #[must_use]
    pub const fn is_permanent_for_key(self) -> bool {
        matches!(self, Self::AuthInvalid)
    }
}

/// `resolve(hash_or_magnet, api_key, options) -> direct_url | null`. One
/// struct per provider implements the same upload -> poll -> pick-file ->
/// unlock -> finalize state machine with provider-specific endpoints,
/// sharing a single trait.
#[async_trait]
pub trait DebridResolver: Send + Sync {
    /// Short tag used in manifest suffixing and `/play` query keys
    /// (`AD`, `RD`, `PM`, `TB`, `OC`).
    fn tag(&self) -> &'static str;

    async fn resolve(
        &self,
        target: ResolveTarget,
        api_key: &str,
        opts: ResolveOptions,
    ) -> Result<Option<Url>, DebridError>;

    /// Cheap probe used to validate a key for manifest suffixing, cached
    /// for five minutes per key by the caller.
    async fn validate_key(&self, api_key: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_hash_extracts_from_magnet_uri() {
        let target = ResolveTarget::Magnet(format!("magnet:?xt=urn:btih:{}&dn=x", "a".repeat(40)));
        assert_eq!(target.info_hash(), "a".repeat(40));
    }

    #[test]
    fn info_hash_passthrough_for_bare_hash() {
        let target = ResolveTarget::InfoHash("b".repeat(40));
        assert_eq!(target.info_hash(), "b".repeat(40));
    }

    #[test]
    fn auth_invalid_is_the_only_permanent_failure() {
        assert!(DebridError::AuthInvalid.is_permanent_for_key());
        assert!(!DebridError::Transient.is_permanent_for_key());
    }
}
