//! Candidate stream data model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Which upstream catalog a candidate was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    TorrentIndexA,
    TorrentIndexB,
    DirectHost,
}

impl Origin {
    /// Short tag used when `label_origin=1` prefixes a stream's display name.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TorrentIndexA => "TA",
            Self::TorrentIndexB => "TB",
            Self::DirectHost => "DH",
        }
    }

    /// Direct-host candidates are the only origin that can require a cookie.
    #[must_use]
    pub const fn can_require_cookie(self) -> bool {
        matches!(self, Self::DirectHost)
    }
}

/// Device class derived from the user-agent. Parameterizes scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Tv,
    Mobile,
    Web,
}

/// Video codec, closed set (unknown stays unknown, never guessed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    H264,
    H265,
    #[default]
    Unknown,
}

/// Container format, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Mp4,
    Mkv,
    Avi,
    #[default]
    Unknown,
}

/// Source quality tier, used by the scorer's source-quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceQuality {
    BlurayRemux,
    WebDl,
    Hdtv,
    #[default]
    Unknown,
}

/// Independently-detected HDR/bit-depth markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrFlag {
    Hdr,
    Hdr10Plus,
    DolbyVision,
    TenBit,
}

/// Features attached to a candidate by the classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateFeatures {
    pub resolution: u32,
    pub codec: Codec,
    pub container: Container,
    pub source: SourceQuality,
    pub bytes: u64,
    pub languages: BTreeSet<String>,
    pub seeders: u32,
    pub release_group: String,
    pub hdr_flags: BTreeSet<HdrFlag>,
}

/// Per-bucket contributions that summed to a candidate's final score.
/// Kept alongside the total purely for debugging / `debug=1` responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: i64,
    pub reliability_penalty: i64,
    pub quality: i64,
    pub source_quality: i64,
    pub container: i64,
    pub release_group: i64,
    pub size: i64,
    pub seeders: i64,
    pub host_bonus: i64,
    pub cookie_bonus: i64,
    pub type_bonus: i64,
}

/// A single normalized search result, enriched along the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateStream {
    pub origin: Origin,
    pub info_hash: Option<String>,
    pub file_index: Option<u32>,
    pub http_url: Option<String>,
    #[serde(default)]
    pub proxy_headers: BTreeMap<String, String>,
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub features: CandidateFeatures,
    #[serde(default)]
    pub score: Option<ScoreBreakdown>,
}

impl CandidateStream {
    /// Construct a candidate, enforcing the invariant that it carries a
    /// usable URL, an info hash, or both.
    pub fn new(
        origin: Origin,
        info_hash: Option<String>,
        http_url: Option<String>,
    ) -> Result<Self, GatewayError> {
        if info_hash.is_none() && http_url.is_none() {
            return Err(GatewayError::Validation(
                "candidate has neither info_hash nor http_url".into(),
            ));
        }
        Ok(Self {
            origin,
            info_hash,
            file_index: None,
            http_url,
            proxy_headers: BTreeMap::new(),
            name: String::new(),
            title: String::new(),
            description: String::new(),
            features: CandidateFeatures::default(),
            score: None,
        })
    }

    /// Combined free text the classifier and filters operate on.
    #[must_use]
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.name, self.title, self.description)
    }

    /// Identity used by the selector to tell the primary and secondary apart:
    /// the info hash when present, else the URL.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.info_hash
            .as_deref()
            .or(self.http_url.as_deref())
            .unwrap_or_default()
    }

    /// Whether this candidate is a torrent (has an info hash) as opposed to
    /// a direct-host URL.
    #[must_use]
    pub const fn is_torrent(&self) -> bool {
        self.info_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_candidate_with_neither_url_nor_hash() {
        let result = CandidateStream::new(Origin::DirectHost, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_hash_only_candidate() {
        let c = CandidateStream::new(Origin::TorrentIndexA, Some("a".repeat(40)), None).unwrap();
        assert!(c.is_torrent());
        assert_eq!(c.identity(), "a".repeat(40));
    }
}
