//! Premiumize resolver. Premiumize's `transfer`/`directdl` endpoints
//! often resolve a cached hash directly to a file list without a visible
//! transfer step, so the "poll" here frequently returns on its first probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Semaphore;
use url::Url;

use crate::http_client::BoundedHttpClient;

use super::cache::DebridCaches;
use super::finalize::{finalize_url, warm_edge};
use super::http_errors::classify_http_error;
use super::poll::poll_until;
use super::season_pack::{pick_file, DebridFile};
use super::traits::{DebridError, DebridResolver, ResolveOptions, ResolveTarget};

const POLL_TOTAL: Duration = Duration::from_secs(12);
const POLL_INTERVAL: Duration = Duration::from_millis(1_500);
const CALL_DEADLINE: Duration = Duration::from_secs(10);

pub struct PremiumizeResolver {
    http: BoundedHttpClient,
    base_url: String,
    caches: DebridCaches,
    semaphore: Arc<Semaphore>,
}

impl PremiumizeResolver {
    #[must_use]
    pub fn new(base_url: impl Into<String>, caches: DebridCaches, semaphore: Arc<Semaphore>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into(), caches, semaphore }
    }

    async fn directdl(&self, info_hash: &str, api_key: &str) -> Result<Vec<(DebridFile, String)>, DebridError> {
        #[derive(Deserialize)]
        struct DirectDlResponse {
            status: String,
            #[serde(default)]
            content: Vec<DirectDlItem>,
        }
        #[derive(Deserialize)]
        struct DirectDlItem {
            path: String,
            size: u64,
            link: String,
        }

        poll_until(
            || async {
                let url = format!(
                    "{}/transfer/directdl?apikey={api_key}&src=magnet:?xt=urn:btih:{info_hash}",
                    self.base_url
                );
                let response = self
                    .http
                    .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
                    .await
                    .map_err(classify_http_error)?;
                let parsed: DirectDlResponse =
                    serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;

                match parsed.status.as_str() {
                    "success" if !parsed.content.is_empty() => Ok(Some(
                        parsed
                            .content
                            .into_iter()
                            .enumerate()
                            .map(|(i, item)| {
                                (DebridFile { index: i as u32, name: item.path, bytes: item.size }, item.link)
                            })
                            .collect(),
                    )),
                    "error" => Err(DebridError::NoFiles),
                    _ => Ok(None),
                }
            },
            POLL_TOTAL,
            POLL_INTERVAL,
        )
        .await
    }
}

#[async_trait]
impl DebridResolver for PremiumizeResolver {
    fn tag(&self) -> &'static str {
        "PM"
    }

    async fn resolve(
        &self,
        target: ResolveTarget,
        api_key: &str,
        opts: ResolveOptions,
    ) -> Result<Option<Url>, DebridError> {
        let _permit = self.semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
        let info_hash = target.info_hash().to_string();

        let pairs = self.directdl(&info_hash, api_key).await?;
        let files: Vec<DebridFile> = pairs.iter().map(|(f, _)| f.clone()).collect();

        let Some(picked) = pick_file(&files, &opts) else {
            return Err(DebridError::NoFiles);
        };
        let Some((_, link)) = pairs.iter().find(|(f, _)| f.index == picked.index) else {
            return Err(DebridError::NoFiles);
        };

        if let Some(cached) = self.caches.get_unlocked_url(api_key, &info_hash, picked.index).await {
            return Ok(Url::parse(&cached).ok());
        }

        let direct_url = Url::parse(link).map_err(|_| DebridError::Transient)?;
        let finalized = finalize_url(&self.http, direct_url.as_str(), CALL_DEADLINE).await.unwrap_or(direct_url);
        self.caches
            .set_unlocked_url(api_key, &info_hash, picked.index, finalized.to_string())
            .await;
        warm_edge(&self.http, &finalized).await;

        Ok(Some(finalized))
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let url = format!("{}/account/info?apikey={api_key}", self.base_url);
        matches!(
            self.http.execute(Method::GET, &url, HeaderMap::new(), None, Duration::from_secs(5)).await,
            Ok(response) if response.status.is_success()
        )
    }
}
