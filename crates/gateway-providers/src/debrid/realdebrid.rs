//! Real-Debrid resolver. Hoster-backed: torrents resolve to a hoster
//! link that still needs `/unrestrict/link` before it's playable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::warn;
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

pub struct RealDebridResolver {
    http: BoundedHttpClient,
    base_url: String,
    caches: DebridCaches,
    semaphore: Arc<Semaphore>,
}

impl RealDebridResolver {
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

    async fn add_magnet(&self, info_hash: &str, api_key: &str) -> Result<String, DebridError> {
        let magnet = format!("magnet:?xt=urn:btih:{info_hash}");
        let response = self
            .http
            .execute(
                Method::POST,
                &format!("{}/torrents/addMagnet", self.base_url),
                Self::auth_headers(api_key)?,
                Some(format!("magnet={magnet}").into_bytes()),
                CALL_DEADLINE,
            )
            .await
            .map_err(classify_http_error)?;

        #[derive(Deserialize)]
        struct AddResponse {
            id: String,
        }
        let parsed: AddResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Ok(parsed.id)
    }

    async fn poll_torrent_info(&self, job_id: &str, api_key: &str) -> Result<Vec<DebridFile>, DebridError> {
        #[derive(Deserialize)]
        struct InfoResponse {
            status: String,
            #[serde(default)]
            files: Vec<InfoFile>,
        }
        #[derive(Deserialize)]
        struct InfoFile {
            id: u32,
            path: String,
            bytes: u64,
        }

        poll_until(
            || async {
                let response = self
                    .http
                    .execute(
                        Method::GET,
                        &format!("{}/torrents/info/{job_id}", self.base_url),
                        Self::auth_headers(api_key)?,
                        None,
                        CALL_DEADLINE,
                    )
                    .await
                    .map_err(classify_http_error)?;

                let parsed: InfoResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;

                match parsed.status.as_str() {
                    "magnet_error" | "error" | "virus" | "dead" => Err(DebridError::NoFiles),
                    "waiting_files_selection" | "downloaded" if !parsed.files.is_empty() => Ok(Some(
                        parsed
                            .files
                            .into_iter()
                            .map(|f| DebridFile { index: f.id, name: f.path, bytes: f.bytes })
                            .collect(),
                    )),
                    _ => Ok(None),
                }
            },
            POLL_TOTAL,
            POLL_INTERVAL,
        )
        .await
    }

    async fn unrestrict(&self, hoster_link: &str, api_key: &str) -> Result<Url, DebridError> {
        let response = self
            .http
            .execute(
                Method::POST,
                &format!("{}/unrestrict/link", self.base_url),
                Self::auth_headers(api_key)?,
                Some(format!("link={hoster_link}").into_bytes()),
                CALL_DEADLINE,
            )
            .await
            .map_err(classify_http_error)?;

        #[derive(Deserialize)]
        struct UnrestrictResponse {
            download: String,
        }
        let parsed: UnrestrictResponse =
            serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Url::parse(&parsed.download).map_err(|_| DebridError::Transient)
    }
}

#[async_trait]
impl DebridResolver for RealDebridResolver {
    fn tag(&self) -> &'static str {
        "RD"
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
                let job_id = self.add_magnet(&info_hash, api_key).await?;
                let files = self.poll_torrent_info(&job_id, api_key).await?;
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

        let hoster_link = format!("{}/d/{}/{}", self.base_url, info_hash, file.index);
        let unlocked = self.unrestrict(&hoster_link, api_key).await?;
        let finalized = finalize_url(&self.http, unlocked.as_str(), CALL_DEADLINE).await.unwrap_or(unlocked);

        self.caches
            .set_unlocked_url(api_key, &info_hash, file.index, finalized.to_string())
            .await;

        warm_edge(&self.http, &finalized).await;

        Ok(Some(finalized))
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        matches!(
            self.http
                .execute(
                    Method::GET,
                    &format!("{}/user", self.base_url),
                    Self::auth_headers(api_key).unwrap_or_default(),
                    None,
                    Duration::from_secs(5),
                )
                .await,
            Ok(response) if response.status.is_success()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn validate_key_true_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/user")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let resolver = RealDebridResolver::new(server.uri(), DebridCaches::new(10, 10), Arc::new(Semaphore::new(3)));
        assert!(resolver.validate_key("key").await);
    }

    #[tokio::test]
    async fn validate_key_false_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/user")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

        let resolver = RealDebridResolver::new(server.uri(), DebridCaches::new(10, 10), Arc::new(Semaphore::new(3)));
        assert!(!resolver.validate_key("key").await);
    }
}
