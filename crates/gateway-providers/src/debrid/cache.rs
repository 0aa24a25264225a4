//! Per-provider debrid caches: file lists, unlocked URLs, and
//! link-level resolutions. Keys embed the API key because entitlements
//! (and therefore valid file lists/links) are scoped to one account.

use std::time::Duration;

use gateway_core::cache::TtlCache;

use super::season_pack::DebridFile;

const ONE_HOUR: Duration = Duration::from_secs(3_600);
const ONE_DAY: Duration = Duration::from_secs(86_400);

#[derive(Clone)]
pub struct DebridCaches {
    file_lists: TtlCache<(String, String), Vec<DebridFile>>,
    unlocked_urls: TtlCache<(String, String, u32), String>,
    link_resolutions: TtlCache<(String, String), String>,
}

impl DebridCaches {
    #[must_use]
    pub fn new(file_list_capacity: u64, unlock_capacity: u64) -> Self {
        Self {
            file_lists: TtlCache::new(file_list_capacity, ONE_DAY),
            unlocked_urls: TtlCache::new(unlock_capacity, ONE_HOUR),
            link_resolutions: TtlCache::new(unlock_capacity, ONE_HOUR),
        }
    }

    pub async fn get_file_list(&self, api_key: &str, hash: &str) -> Option<Vec<DebridFile>> {
        self.file_lists.get(&(api_key.to_string(), hash.to_string())).await
    }

    pub async fn set_file_list(&self, api_key: &str, hash: &str, files: Vec<DebridFile>) {
        self.file_lists.set((api_key.to_string(), hash.to_string()), files).await;
    }

    pub async fn get_unlocked_url(&self, api_key: &str, hash: &str, file_index: u32) -> Option<String> {
        self.unlocked_urls.get(&(api_key.to_string(), hash.to_string(), file_index)).await
    }

    pub async fn set_unlocked_url(&self, api_key: &str, hash: &str, file_index: u32, url: String) {
        self.unlocked_urls
            .set((api_key.to_string(), hash.to_string(), file_index), url)
            .await;
    }

    pub async fn get_link_resolution(&self, api_key: &str, link: &str) -> Option<String> {
        self.link_resolutions.get(&(api_key.to_string(), link.to_string())).await
    }

    pub async fn set_link_resolution(&self, api_key: &str, link: &str, url: String) {
        self.link_resolutions.set((api_key.to_string(), link.to_string()), url).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_list_round_trips_per_key_and_hash() {
        let caches = DebridCaches::new(100, 100);
        let files = vec![DebridFile { index: 0, name: "a".to_string(), bytes: 10 }];
        caches.set_file_list("key1", "hash1", files.clone()).await;
        assert_eq!(caches.get_file_list("key1", "hash1").await.unwrap().len(), 1);
        assert!(caches.get_file_list("key2", "hash1").await.is_none());
    }

    #[tokio::test]
    async fn unlocked_url_round_trips() {
        let caches = DebridCaches::new(100, 100);
        caches.set_unlocked_url("key1", "hash1", 0, "https://cdn.example/a".to_string()).await;
        assert_eq!(
            caches.get_unlocked_url("key1", "hash1", 0).await.unwrap(),
            "https://cdn.example/a"
        );
    }
}
