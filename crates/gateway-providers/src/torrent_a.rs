//! Torrent indexer A client, a Torrentio-style stream addon.

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
    streams: Vec<IndexerStream>,
}

#[derive(Debug, Deserialize)]
struct IndexerStream {
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
    size: Option<u64>,
}

pub struct TorrentIndexAProvider {
    http: BoundedHttpClient,
    base_url: String,
}

impl TorrentIndexAProvider {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: BoundedHttpClient::shared(), base_url: base_url.into() }
    }

    fn request_path(&self, query: &ContentQuery) -> String {
        let kind = match query.kind {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        };
        match (query.season, query.episode) {
            (Some(season), Some(episode)) => {
                format!("{}/stream/{kind}/{}:{season}:{episode}.json", self.base_url, query.imdb_id)
            }
            _ => format!("{}/stream/{kind}/{}.json", self.base_url, query.imdb_id),
        }
    }
}

#[async_trait]
impl StreamProvider for TorrentIndexAProvider {
    fn origin(&self) -> Origin {
        Origin::TorrentIndexA
    }

    async fn fetch(&self, query: &ContentQuery, deadline: Duration) -> Vec<CandidateStream> {
        let url = self.request_path(query);

        let response = match self.http.get(&url, deadline).await {
            Ok(response) => response,
            Err(err) => {
                warn!(provider = "torrent_index_a", error = %err, "fetch failed");
                return Vec::new();
            }
        };

        let parsed: IndexerResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(provider = "torrent_index_a", error = %err, "malformed response");
                return Vec::new();
            }
        };

        parsed
            .streams
            .into_iter()
            .filter_map(|stream| {
                let mut candidate =
                    CandidateStream::new(Origin::TorrentIndexA, stream.info_hash, None).ok()?;
                candidate.name = stream.name;
                candidate.title = stream.title;
                candidate.description = stream.description;
                candidate.file_index = stream.file_idx;
                if let Some(size) = stream.size {
                    candidate.features.bytes = size;
                }
                Some(candidate)
            })
            .collect()
    }
}
