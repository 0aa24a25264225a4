//! TorBox resolver. Bearer-token auth like Real-Debrid, but the
//! direct URL is read straight from the job record rather than requiring a
//! separate unlock call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
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

pub struct TorBoxResolver {
    http: BoundedHttpClient,
    base_url: String,
    caches: DebridCaches,
    semaphore: Arc<Semaphore>,
}

impl TorBoxResolver {
    #[must_use]
    pub fn new(base_url: impl Into<String>, caches: DebridCaches, semaphore: Arc<Semaphore>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into(), caches, semaphore }
    }

    fn auth_headers(api_key: &str) -> Result<HeaderMap, DebridError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| DebridError::AuthInvalid)?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn create_torrent(&self, info_hash: &str, api_key: &str) -> Result<String, DebridError> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }
        #[derive(Deserialize)]
        struct CreateData {
            torrent_id: String,
        }

        let response = self
            .http
            .execute(
                Method::POST,
                &format!("{}/torrents/createtorrent", self.base_url),
                Self::auth_headers(api_key)?,
                Some(format!("magnet=magnet:?xt=urn:btih:{info_hash}").into_bytes()),
                CALL_DEADLINE,
            )
            .await
            .map_err(classify_http_error)?;
        let parsed: CreateResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Ok(parsed.data.torrent_id)
    }

    async fn poll_info(&self, torrent_id: &str, api_key: &str) -> Result<Vec<DebridFile>, DebridError> {
        #[derive(Deserialize)]
        struct InfoResponse {
            data: InfoData,
        }
        #[derive(Deserialize)]
        struct InfoData {
            download_state: String,
            #[serde(default)]
            files: Vec<InfoFile>,
        }
        #[derive(Deserialize)]
        struct InfoFile {
            id: u32,
            name: String,
            size: u64,
        }

        poll_until(
            || async {
                let url = format!("{}/torrents/mylist?id={torrent_id}", self.base_url);
                let response = self
                    .http
                    .execute(Method::GET, &url, Self::auth_headers(api_key)?, None, CALL_DEADLINE)
                    .await
                    .map_err(classify_http_error)?;
                let parsed: InfoResponse =
                    serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;

                match parsed.data.download_state.as_str() {
                    "completed" | "cached" if !parsed.data.files.is_empty() => Ok(Some(
                        parsed
                            .data
                            .files
                            .into_iter()
                            .map(|f| DebridFile { index: f.id, name: f.name, bytes: f.size })
                            .collect(),
                    )),
                    "failed" | "error" => Err(DebridError::NoFiles),
                    _ => Ok(None),
                }
            },
            POLL_TOTAL,
            POLL_INTERVAL,
        )
        .await
    }

    async fn request_download(&self, torrent_id: &str, file_id: u32, api_key: &str) -> Result<Url, DebridError> {
        #[derive(Deserialize)]
        struct DownloadResponse {
            data: String,
        }

        let url = format!("{}/torrents/requestdl?token={api_key}&torrent_id={torrent_id}&file_id={file_id}", self.base_url);
        let response = self
            .http
            .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
            .await
            .map_err(classify_http_error)?;
        let parsed: DownloadResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Url::parse(&parsed.data).map_err(|_| DebridError::Transient)
    }
}

#[async_trait]
impl DebridResolver for TorBoxResolver {
    fn tag(&self) -> &'static str {
        "TB"
    }

    async fn resolve(
        &self,
        target: ResolveTarget,
        api_key: &str,
        opts: ResolveOptions,
    ) -> Result<Option<Url>, DebridError> {
        let _permit = self.semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
        let info_hash = target.info_hash().to_string();

        let files = match self.caches.get_file_list(api_key, &info_hash).await {
            Some(files) => files,
            None => {
                let torrent_id = self.create_torrent(&info_hash, api_key).await?;
                let files = self.poll_info(&torrent_id, api_key).await?;
                self.caches.set_file_list(api_key, &info_hash, files.clone()).await;
                files
            }
        };

        let Some(file) = pick_file(&files, &opts) else {
            return Err(DebridError::NoFiles);
        };

        if let Some(cached) = self.caches.get_unlocked_url(api_key, &info_hash, file.index).await {
            return Ok(Url::parse(&cached).ok());
        }

        let torrent_id = self.create_torrent(&info_hash, api_key).await?;
        let direct_url = self.request_download(&torrent_id, file.index, api_key).await?;
        let finalized = finalize_url(&self.http, direct_url.as_str(), CALL_DEADLINE).await.unwrap_or(direct_url);
        self.caches
            .set_unlocked_url(api_key, &info_hash, file.index, finalized.to_string())
            .await;
        warm_edge(&self.http, &finalized).await;

        Ok(Some(finalized))
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let headers = match Self::auth_headers(api_key) {
            Ok(headers) => headers,
            Err(_) => return false,
        };
        matches!(
            self.http
                .execute(Method::GET, &format!("{}/user/me", self.base_url), headers, None, Duration::from_secs(5))
                .await,
            Ok(response) if response.status.is_success()
        )
    }
}
