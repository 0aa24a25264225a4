//! Generic TTL+LRU cache, backed by `moka`.
//!
//! Moka already runs its own background sweeper and enforces
//! size-based eviction on insert, so this wrapper only needs to name the
//! capacity/TTL per logical cache and expose the narrow `get`/`set`
//! contract the rest of the gateway depends on.

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache as MokaCache;

/// A named TTL+LRU cache over `K -> V`.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: MokaCache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(max_capacity: u64, time_to_live: Duration) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_capacity)
            .time_to_live(time_to_live)
            .build();
        Self { inner }
    }

    /// Fetch a value if present and not expired. Lazily evicts on read as a
    /// side effect of moka's own expiry check.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    /// Insert or overwrite a value, evicting the least-recently-used entry
    /// first if the cache is at capacity.
    pub async fn set(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache: TtlCache<String, u32> = TtlCache::new(100, Duration::from_secs(60));
        cache.set("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let cache: TtlCache<String, u32> = TtlCache::new(100, Duration::from_secs(60));
        assert_eq!(cache.get(&"missing".to_string()).await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache: TtlCache<String, u32> = TtlCache::new(100, Duration::from_secs(60));
        cache.set("a".to_string(), 1).await;
        cache.invalidate(&"a".to_string()).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }
}
