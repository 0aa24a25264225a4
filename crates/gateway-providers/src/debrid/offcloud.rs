//! Offcloud resolver. Works at the link level rather than the hash
//! level — a single "cloud" request both requests the torrent and returns
//! its ready-to-play URL, so this resolver uses the link-resolution cache
//! instead of the file-list cache.

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

pub struct OffcloudResolver {
    http: BoundedHttpClient,
    base_url: String,
    caches: DebridCaches,
    semaphore: Arc<Semaphore>,
}

impl OffcloudResolver {
    #[must_use]
    pub fn new(base_url: impl Into<String>, caches: DebridCaches, semaphore: Arc<Semaphore>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into(), caches, semaphore }
    }

    async fn request_cloud(&self, info_hash: &str, api_key: &str) -> Result<String, DebridError> {
        #[derive(Deserialize)]
        struct CloudResponse {
            #[serde(rename = "requestId")]
            request_id: String,
        }

        let url = format!("{}/api/cloud?key={api_key}", self.base_url);
        let body = format!("url=magnet:?xt=urn:btih:{info_hash}").into_bytes();
        let response = self
            .http
            .execute(Method::POST, &url, HeaderMap::new(), Some(body), CALL_DEADLINE)
            .await
            .map_err(classify_http_error)?;
        let parsed: CloudResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Ok(parsed.request_id)
    }

    async fn poll_status(&self, request_id: &str, api_key: &str) -> Result<Vec<(DebridFile, String)>, DebridError> {
        #[derive(Deserialize)]
        struct StatusResponse {
            status: String,
            #[serde(default)]
            server: Option<String>,
            #[serde(default)]
            file_names: Vec<String>,
            #[serde(default)]
            file_sizes: Vec<u64>,
        }

        poll_until(
            || async {
                let url = format!("{}/api/cloud/status?key={api_key}&request_id={request_id}", self.base_url);
                let response = self
                    .http
                    .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
                    .await
                    .map_err(classify_http_error)?;
                let parsed: StatusResponse =
                    serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;

                match (parsed.status.as_str(), parsed.server) {
                    ("downloaded", Some(server)) if !parsed.file_names.is_empty() => {
                        let links: Vec<(DebridFile, String)> = parsed
                            .file_names
                            .into_iter()
                            .zip(parsed.file_sizes)
                            .enumerate()
                            .map(|(i, (name, size))| {
                                let link = format!("{server}/cloud/download/{request_id}/{i}");
                                (DebridFile { index: i as u32, name, bytes: size }, link)
                            })
                            .collect();
                        Ok(Some(links))
                    }
                    ("error", _) | ("canceled", _) => Err(DebridError::NoFiles),
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
impl DebridResolver for OffcloudResolver {
    fn tag(&self) -> &'static str {
        "OC"
    }

    async fn resolve(
        &self,
        target: ResolveTarget,
        api_key: &str,
        opts: ResolveOptions,
    ) -> Result<Option<Url>, DebridError> {
        let _permit = self.semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
        let info_hash = target.info_hash().to_string();

        if let Some(cached) = self.caches.get_link_resolution(api_key, &info_hash).await {
            return Ok(Url::parse(&cached).ok());
        }

        let request_id = self.request_cloud(&info_hash, api_key).await?;
        let pairs = self.poll_status(&request_id, api_key).await?;
        let files: Vec<DebridFile> = pairs.iter().map(|(f, _)| f.clone()).collect();

        let Some(picked) = pick_file(&files, &opts) else {
            return Err(DebridError::NoFiles);
        };
        let Some((_, link)) = pairs.iter().find(|(f, _)| f.index == picked.index) else {
            return Err(DebridError::NoFiles);
        };

        let direct_url = Url::parse(link).map_err(|_| DebridError::Transient)?;
        let finalized = finalize_url(&self.http, direct_url.as_str(), CALL_DEADLINE).await.unwrap_or(direct_url);
        self.caches.set_link_resolution(api_key, &info_hash, finalized.to_string()).await;
        warm_edge(&self.http, &finalized).await;

        Ok(Some(finalized))
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let url = format!("{}/api/account/stats?key={api_key}", self.base_url);
        matches!(
            self.http.execute(Method::GET, &url, HeaderMap::new(), None, Duration::from_secs(5)).await,
            Ok(response) if response.status.is_success()
        )
    }
}
