//! Direct-host indexer client. Returns ready-to-play URLs rather than
//! torrents; some entries require the caller's cookie to be forwarded.

use std::time::Duration;

use async_trait::async_trait;
use gateway_core::model::{CandidateStream, Origin};
use serde::Deserialize;
use tracing::warn;

use crate::http_client::BoundedHttpClient;
use crate::traits::{ContentKind, ContentQuery, StreamProvider};

#[derive(Debug, Deserialize)]
struct IndexerResponse {
    #[serde(default)]
    items: Vec<IndexerItem>,
}

#[derive(Debug, Deserialize)]
struct IndexerItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    url: String,
    #[serde(default)]
    requires_cookie: bool,
}

pub struct DirectHostProvider {
    http: BoundedHttpClient,
    base_url: String,
}

impl DirectHostProvider {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into() }
    }

    fn request_path(&self, query: &ContentQuery) -> String {
        let kind = match query.kind {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        };
        format!("{}/catalog/{kind}/{}", self.base_url, query.imdb_id)
    }
}

#[async_trait]
impl StreamProvider for DirectHostProvider {
    fn origin(&self) -> Origin {
        Origin::DirectHost
    }

    async fn fetch(&self, query: &ContentQuery, deadline: Duration) -> Vec<CandidateStream> {
        let url = self.request_path(query);

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(cookie) = &query.cookie {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&format!("ui={cookie}")) {
                headers.insert(reqwest::header::COOKIE, value);
            }
        }

        let response = match self
            .http
            .execute(reqwest::Method::GET, &url, headers, None, deadline)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(provider = "direct_host", error = %err, "fetch failed");
                return Vec::new();
            }
        };

        let parsed: IndexerResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(provider = "direct_host", error = %err, "malformed response");
                return Vec::new();
            }
        };

        parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let mut candidate =
                    CandidateStream::new(Origin::DirectHost, None, Some(item.url)).ok()?;
                candidate.name = item.name;
                candidate.title = item.title;
                candidate.description = item.description;
                if item.requires_cookie {
                    if let Some(cookie) = &query.cookie {
                        candidate.proxy_headers.insert("Cookie".to_string(), format!("ui={cookie}"));
                    }
                }
                Some(candidate)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_attaches_cookie_header_when_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/movie/tt1234567"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"name": "D", "title": "Movie", "url": "https://host.example/a.mp4", "requires_cookie": true}
                ]
            })))
            .mount(&server)
            .await;

        let provider = DirectHostProvider::new(server.uri());
        let query = ContentQuery {
            kind: ContentKind::Movie,
            imdb_id: "tt1234567".to_string(),
            season: None,
            episode: None,
            cookie: Some("session-token".to_string()),
        };

        let candidates = provider.fetch(&query, Duration::from_secs(5)).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].proxy_headers.get("Cookie").unwrap(), "ui=session-token");
    }

    #[tokio::test]
    async fn fetch_without_cookie_leaves_headers_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/movie/tt1234567"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"name": "D", "title": "Movie", "url": "https://host.example/a.mp4", "requires_cookie": false}
                ]
            })))
            .mount(&server)
            .await;

        let provider = DirectHostProvider::new(server.uri());
        let query = ContentQuery {
            kind: ContentKind::Movie,
            imdb_id: "tt1234567".to_string(),
            season: None,
            episode: None,
            cookie: None,
        };

        let candidates = provider.fetch(&query, Duration::from_secs(5)).await;
        assert!(candidates[0].proxy_headers.is_empty());
    }
}
