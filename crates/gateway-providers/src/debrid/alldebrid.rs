//! AllDebrid resolver. Hoster-backed, keyed by an `apikey` query
//! parameter rather than a bearer token.

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
use super::poll::poll_until;
use super::http_errors::classify_http_error;
use super::season_pack::{pick_file, DebridFile};
use super::traits::{DebridError, DebridResolver, ResolveOptions, ResolveTarget};

const POLL_TOTAL: Duration = Duration::from_secs(12);
const POLL_INTERVAL: Duration = Duration::from_millis(1_500);
const CALL_DEADLINE: Duration = Duration::from_secs(10);

pub struct AllDebridResolver {
    http: BoundedHttpClient,
    base_url: String,
    caches: DebridCaches,
    semaphore: Arc<Semaphore>,
}

impl AllDebridResolver {
    #[must_use]
    pub fn new(base_url: impl Into<String>, caches: DebridCaches, semaphore: Arc<Semaphore>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into(), caches, semaphore }
    }

    async fn add_magnet(&self, info_hash: &str, api_key: &str) -> Result<String, DebridError> {
        #[derive(Deserialize)]
        struct AddResponse {
            data: AddData,
        }
        #[derive(Deserialize)]
        struct AddData {
            id: String,
        }

        let url = format!(
            "{}/magnet/upload?agent=autostream&apikey={api_key}&magnets[]=magnet:?xt=urn:btih:{info_hash}",
            self.base_url
        );
        let response = self
            .http
            .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
            .await
            .map_err(classify_http_error)?;
        let parsed: AddResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Ok(parsed.data.id)
    }

    async fn poll_status(&self, job_id: &str, api_key: &str) -> Result<Vec<DebridFile>, DebridError> {
        #[derive(Deserialize)]
        struct StatusResponse {
            data: StatusData,
        }
        #[derive(Deserialize)]
        struct StatusData {
            magnets: StatusMagnet,
        }
        #[derive(Deserialize)]
        struct StatusMagnet {
            status: String,
            #[serde(default)]
            links: Vec<StatusLink>,
        }
        #[derive(Deserialize)]
        struct StatusLink {
            filename: String,
            size: u64,
        }

        poll_until(
            || async {
                let url = format!("{}/magnet/status?apikey={api_key}&id={job_id}", self.base_url);
                let response = self
                    .http
                    .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
                    .await
                    .map_err(classify_http_error)?;
                let parsed: StatusResponse =
                    serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;

                match parsed.data.magnets.status.as_str() {
                    "Ready" if !parsed.data.magnets.links.is_empty() => Ok(Some(
                        parsed
                            .data
                            .magnets
                            .links
                            .into_iter()
                            .enumerate()
                            .map(|(i, l)| DebridFile { index: i as u32, name: l.filename, bytes: l.size })
                            .collect(),
                    )),
                    "Error" | "Dead" => Err(DebridError::NoFiles),
                    _ => Ok(None),
                }
            },
            POLL_TOTAL,
            POLL_INTERVAL,
        )
        .await
    }

    async fn unlock(&self, link: &str, api_key: &str) -> Result<Url, DebridError> {
        #[derive(Deserialize)]
        struct UnlockResponse {
            data: UnlockData,
        }
        #[derive(Deserialize)]
        struct UnlockData {
            link: String,
        }

        let url = format!("{}/link/unlock?apikey={api_key}&link={link}", self.base_url);
        let response = self
            .http
            .execute(Method::GET, &url, HeaderMap::new(), None, CALL_DEADLINE)
            .await
            .map_err(classify_http_error)?;
        let parsed: UnlockResponse = serde_json::from_slice(&response.body).map_err(|_| DebridError::Transient)?;
        Url::parse(&parsed.data.link).map_err(|_| DebridError::Transient)
    }
}

#[async_trait]
impl DebridResolver for AllDebridResolver {
    fn tag(&self) -> &'static str {
        "AD"
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
                let files = self.poll_status(&job_id, api_key).await?;
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

        let unlocked = self.unlock(&file.name, api_key).await?;
        let finalized = finalize_url(&self.http, unlocked.as_str(), CALL_DEADLINE).await.unwrap_or(unlocked);
        self.caches
            .set_unlocked_url(api_key, &info_hash, file.index, finalized.to_string())
            .await;
        warm_edge(&self.http, &finalized).await;

        Ok(Some(finalized))
    }

    async fn validate_key(&self, api_key: &str) -> bool {
        let url = format!("{}/user?apikey={api_key}", self.base_url);
        matches!(
            self.http.execute(Method::GET, &url, HeaderMap::new(), None, Duration::from_secs(5)).await,
            Ok(response) if response.status.is_success()
        )
    }
}
