//! Bounded HTTP client.
//!
//! A single pooled `reqwest::Client` is built once at process start and
//! cloned into every provider and resolver. Callers never construct their
//! own client.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "AutoStream-Gateway/1.0 (+https://github.com/autostream-gateway)";
const MAX_REDIRECTS: usize = 3;

static SHARED_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(20))
        .pool_max_idle_per_host(16)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .expect("failed to build shared HTTP client")
});

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned {0}")]
    HttpError(StatusCode),
}

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: reqwest::header::HeaderMap,
    pub body: bytes::Bytes,
    /// URL after following redirects — the shared client's policy already
    /// bounds this to `MAX_REDIRECTS` hops.
    pub final_url: reqwest::Url,
}

/// Thin wrapper around the shared client that enforces a per-call deadline
/// and classifies the outcome. No retries here — retry policy belongs to
/// callers (provider clients, debrid resolvers).
#[derive(Clone)]
pub struct BoundedHttpClient {
    client: Client,
}

impl BoundedHttpClient {
    #[must_use]
    pub fn shared() -> Self {
        Self { client: SHARED_CLIENT.clone() }
    }

    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: reqwest::header::HeaderMap,
        body: Option<Vec<u8>>,
        deadline: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = tokio::time::timeout(deadline, request.send())
            .await
            .map_err(|_| HttpError::Timeout)?
            .map_err(|err| HttpError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpError(status));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = tokio::time::timeout(deadline, response.bytes())
            .await
            .map_err(|_| HttpError::Timeout)?
            .map_err(|err| HttpError::Network(err.to_string()))?;

        Ok(HttpResponse { status, headers, body, final_url })
    }

    pub async fn get(&self, url: &str, deadline: Duration) -> Result<HttpResponse, HttpError> {
        self.execute(Method::GET, url, reqwest::header::HeaderMap::new(), None, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = BoundedHttpClient::shared();
        let response = client
            .get(&format!("{}/ok", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "hello");
    }

    #[tokio::test]
    async fn server_error_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = BoundedHttpClient::shared();
        let result = client.get(&format!("{}/broken", server.uri()), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(HttpError::HttpError(StatusCode::INTERNAL_SERVER_ERROR))));
    }

    #[tokio::test]
    async fn client_error_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unauthorized"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = BoundedHttpClient::shared();
        let result = client.get(&format!("{}/unauthorized", server.uri()), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(HttpError::HttpError(StatusCode::UNAUTHORIZED))));
    }

    #[tokio::test]
    async fn slow_response_past_deadline_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let client = BoundedHttpClient::shared();
        let result = client
            .get(&format!("{}/slow", server.uri()), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(HttpError::Timeout)));
    }
}
