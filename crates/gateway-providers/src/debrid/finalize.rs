//! Finalization: follow redirects to the real destination
//! and optionally warm the CDN edge with a tiny ranged GET, best-effort.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::http_client::BoundedHttpClient;

use super::traits::DebridError;

pub async fn finalize_url(
    http: &BoundedHttpClient,
    candidate_url: &str,
    deadline: Duration,
) -> Result<Url, DebridError> {
    let response = http
        .execute(Method::HEAD, candidate_url, HeaderMap::new(), None, deadline)
        .await
        .map_err(|_| DebridError::Transient)?;

    Url::parse(response.final_url.as_str()).map_err(|_| DebridError::Transient)
}

/// Best-effort cache warm: a tiny ranged GET that's allowed to fail
/// silently and never blocks the caller's response.
pub async fn warm_edge(http: &BoundedHttpClient, url: &Url) {
    let mut headers = HeaderMap::new();
    headers.insert(RANGE, HeaderValue::from_static("bytes=0-1023"));

    if let Err(err) = http
        .execute(Method::GET, url.as_str(), headers, None, Duration::from_secs(3))
        .await
    {
        debug!(error = %err, "edge warm-up failed, ignoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn finalize_follows_redirect_to_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/redirect"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/final"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD")).and(path("/final")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let http = BoundedHttpClient::shared();
        let result = finalize_url(&http, &format!("{}/redirect", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(result.as_str().ends_with("/final"));
    }
}
