//! Torrent indexer B client. Unlike indexer A, this upstream doesn't
//! expose a structured size/seeders field — both are folded into a
//! trailing description line (`<seeders> <size> <unit>`) that the
//! classifier's text scan picks up.

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
    results: Vec<IndexerResult>,
}

#[derive(Debug, Deserialize)]
struct IndexerResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "infoHash")]
    info_hash: Option<String>,
    #[serde(rename = "fileIdx")]
    file_idx: Option<u32>,
}

pub struct TorrentIndexBProvider {
    http: BoundedHttpClient,
    base_url: String,
}

impl TorrentIndexBProvider {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into() }
    }

    fn request_path(&self, query: &ContentQuery) -> String {
        let kind = match query.kind {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        };
        format!("{}/search/{kind}/{}", self.base_url, query.imdb_id)
    }
}

#[async_trait]
impl StreamProvider for TorrentIndexBProvider {
    fn origin(&self) -> Origin {
        Origin::TorrentIndexB
    }

    async fn fetch(&self, query: &ContentQuery, deadline: Duration) -> Vec<CandidateStream> {
        let url = self.request_path(query);

        let response = match self.http.get(&url, deadline).await {
            Ok(response) => response,
            Err(err) => {
                warn!(provider = "torrent_index_b", error = %err, "fetch failed");
                return Vec::new();
            }
        };

        let parsed: IndexerResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(provider = "torrent_index_b", error = %err, "malformed response");
                return Vec::new();
            }
        };

        parsed
            .results
            .into_iter()
            .filter_map(|result| {
                let mut candidate =
                    CandidateStream::new(Origin::TorrentIndexB, result.info_hash, None).ok()?;
                candidate.name = result.name;
                candidate.title = result.title;
                candidate.description = result.description;
                candidate.file_index = result.file_idx;
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
    async fn fetch_keeps_trailing_line_for_classifier_to_parse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie/tt1234567"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"name": "B", "title": "Movie 720p", "description": "42 1.4 GB", "infoHash": "b".repeat(40)}
                ]
            })))
            .mount(&server)
            .await;

        let provider = TorrentIndexBProvider::new(server.uri());
        let query = ContentQuery {
            kind: ContentKind::Movie,
            imdb_id: "tt1234567".to_string(),
            season: None,
            episode: None,
            cookie: None,
        };

        let candidates = provider.fetch(&query, Duration::from_secs(5)).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].description, "42 1.4 GB");
        assert_eq!(candidates[0].features.bytes, 0); // classifier runs later, not inside the provider
    }
}
