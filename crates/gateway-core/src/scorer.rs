//! Device-aware scoring rubric.
//!
//! The scorer is pure given a candidate's extracted features, the current
//! device class, the caller's reliability snapshot and a small set of
//! operator-configured lists (premium hosts, CDN suffixes, release-group
//! allow/deny). It never performs I/O.

use serde::{Deserialize, Serialize};

use crate::model::{CandidateStream, Codec, Container, DeviceClass, HdrFlag, Origin, ScoreBreakdown, SourceQuality};

const BASE_SCORE: i64 = 800;

/// Operator-tunable lists that feed the host-bonus and release-group
/// buckets. Not secrets; loaded from `GatewayConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub release_group_allow: Vec<String>,
    pub release_group_deny: Vec<String>,
    pub premium_hosts: Vec<String>,
    pub cdn_suffixes: Vec<String>,
}

/// Everything the scorer needs about a candidate's runtime context that
/// isn't already captured in `CandidateFeatures`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext<'a> {
    pub host: Option<&'a str>,
    pub reliability_penalty: i64,
    pub cookie_present: bool,
    pub debrid_available: bool,
}

/// Compute the full score breakdown for one candidate.
#[must_use]
pub fn score(
    candidate: &CandidateStream,
    device: DeviceClass,
    ctx: ScoringContext<'_>,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let features = &candidate.features;

    let quality = quality_bucket(device, features.resolution, &features.hdr_flags, features.codec);
    let source_quality = source_quality_bucket(device, features.source);
    let container = container_bucket(device, features.container);
    let release_group = release_group_bucket(&features.release_group, config);
    let size = size_bucket(device, features.resolution, features.bytes);
    let seeders = seeders_bucket(features.seeders);
    let host_bonus = host_bonus_bucket(candidate, ctx, config);
    let (cookie_bonus, no_cookie_penalty) = cookie_bucket(candidate, ctx);
    let type_bonus = type_bonus_bucket(candidate.origin);

    let total = BASE_SCORE - ctx.reliability_penalty
        + quality
        + source_quality
        + container
        + release_group
        + size
        + seeders
        + host_bonus
        + cookie_bonus
        - no_cookie_penalty
        + type_bonus;

    ScoreBreakdown {
        total,
        reliability_penalty: ctx.reliability_penalty,
        quality,
        source_quality,
        container,
        release_group,
        size,
        seeders,
        host_bonus,
        cookie_bonus: cookie_bonus - no_cookie_penalty,
        type_bonus,
    }
}

fn quality_bucket(device: DeviceClass, resolution: u32, hdr: &std::collections::BTreeSet<HdrFlag>, codec: Codec) -> i64 {
    let resolution_points = match (device, resolution) {
        (DeviceClass::Tv, 2160) => 40,
        (DeviceClass::Tv, 1080) => 30,
        (DeviceClass::Tv, 720) => 20,
        (DeviceClass::Tv, 480) => 10,
        (DeviceClass::Mobile, 2160) => 20,
        (DeviceClass::Mobile, 1080) => 35,
        (DeviceClass::Mobile, 720) => 25,
        (DeviceClass::Mobile, 480) => 15,
        (DeviceClass::Web, 2160) => 40,
        (DeviceClass::Web, 1080) => 30,
        (DeviceClass::Web, 720) => 20,
        (DeviceClass::Web, 480) => 10,
        _ => 0,
    };

    let hdr_points = if hdr.contains(&HdrFlag::Hdr10Plus) || hdr.contains(&HdrFlag::DolbyVision) {
        match device {
            DeviceClass::Tv => 15,
            DeviceClass::Mobile => 20,
            DeviceClass::Web => 25,
        }
    } else if hdr.contains(&HdrFlag::Hdr) {
        match device {
            DeviceClass::Tv => 10,
            DeviceClass::Mobile => 15,
            DeviceClass::Web => 20,
        }
    } else {
        0
    };

    let ten_bit_points = if hdr.contains(&HdrFlag::TenBit) {
        match device {
            DeviceClass::Tv => -25,
            DeviceClass::Mobile => -10,
            DeviceClass::Web => -5,
        }
    } else {
        0
    };

    let codec_points = match (device, codec) {
        (DeviceClass::Tv, Codec::H265) => -60,
        (DeviceClass::Mobile, Codec::H265) => 10,
        (DeviceClass::Web, Codec::H265) => 5,
        (DeviceClass::Tv, Codec::H264) => 40,
        (DeviceClass::Mobile, Codec::H264) => 20,
        (DeviceClass::Web, Codec::H264) => 20,
        (_, Codec::Unknown) => 0,
    };

    resolution_points + hdr_points + ten_bit_points + codec_points
}

fn source_quality_bucket(device: DeviceClass, source: SourceQuality) -> i64 {
    match (device, source) {
        (DeviceClass::Tv, SourceQuality::BlurayRemux) => 20,
        (DeviceClass::Mobile, SourceQuality::BlurayRemux) => 12,
        (DeviceClass::Web, SourceQuality::BlurayRemux) => 15,
        (DeviceClass::Tv, SourceQuality::WebDl) => 10,
        (DeviceClass::Mobile, SourceQuality::WebDl) => 8,
        (DeviceClass::Web, SourceQuality::WebDl) => 8,
        (DeviceClass::Tv, SourceQuality::Hdtv) => 3,
        (DeviceClass::Mobile, SourceQuality::Hdtv) => 3,
        (DeviceClass::Web, SourceQuality::Hdtv) => 3,
        (_, SourceQuality::Unknown) => 0,
    }
}

fn container_bucket(device: DeviceClass, container: Container) -> i64 {
    match (device, container) {
        (DeviceClass::Tv, Container::Mp4) => 25,
        (DeviceClass::Tv, Container::Mkv) => -20,
        (DeviceClass::Tv, Container::Avi) => 15,
        (DeviceClass::Mobile, Container::Mp4) => 20,
        (DeviceClass::Mobile, Container::Mkv) => -10,
        (DeviceClass::Web, Container::Mp4) => 15,
        (DeviceClass::Web, Container::Mkv) => -5,
        _ => 0,
    }
}

fn release_group_bucket(release_group: &str, config: &ScoringConfig) -> i64 {
    if release_group.is_empty() {
        return 0;
    }
    let upper = release_group.to_uppercase();
    if config.release_group_allow.iter().any(|g| g.to_uppercase() == upper) {
        10
    } else if config.release_group_deny.iter().any(|g| g.to_uppercase() == upper) {
        -15
    } else {
        0
    }
}

/// Piecewise size bucket keyed on resolution band: a "too small" penalty,
/// a "good" middle bonus, and on mobile an "oversize" penalty for large 4K.
fn size_bucket(device: DeviceClass, resolution: u32, bytes: u64) -> i64 {
    if bytes == 0 {
        return 0;
    }
    const GB: u64 = 1024 * 1024 * 1024;
    let gb = bytes / GB;

    let (too_small, good_min) = match resolution {
        2160 => (4, 8),
        1080 => (1, 2),
        720 => (0, 1),
        _ => (0, 0),
    };

    let mut points = if gb < too_small {
        -20
    } else if gb >= good_min {
        10
    } else {
        0
    };

    if device == DeviceClass::Mobile && resolution == 2160 && gb >= 20 {
        points -= 15;
    }

    points
}

fn seeders_bucket(seeders: u32) -> i64 {
    match seeders {
        0 => -1000,
        1..=2 => -300,
        3..=4 => -100,
        5..=9 => -20,
        _ => 0,
    }
}

fn host_bonus_bucket(candidate: &CandidateStream, ctx: ScoringContext<'_>, config: &ScoringConfig) -> i64 {
    if candidate.is_torrent() && ctx.debrid_available {
        return 30;
    }

    let Some(host) = ctx.host else { return 0 };
    let host = host.to_lowercase();

    if config.premium_hosts.iter().any(|h| h.to_lowercase() == host) {
        return 25;
    }
    if config.cdn_suffixes.iter().any(|suffix| host.ends_with(&suffix.to_lowercase())) {
        return 15;
    }
    if host.parse::<std::net::IpAddr>().is_ok() || is_suspicious_tld(&host) {
        return -10;
    }
    0
}

fn is_suspicious_tld(host: &str) -> bool {
    const SUSPICIOUS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".gq", ".xyz"];
    SUSPICIOUS.iter().any(|tld| host.ends_with(tld))
}

/// Direct-host candidates whose origin requires a user cookie get a small
/// bonus when it's present, or a heavy penalty (effectively demoted) when
/// it's missing. Returns `(bonus, penalty)` so callers can report both.
fn cookie_bucket(candidate: &CandidateStream, ctx: ScoringContext<'_>) -> (i64, i64) {
    if !candidate.origin.can_require_cookie() {
        return (0, 0);
    }
    if ctx.cookie_present {
        (3, 0)
    } else {
        (0, 400)
    }
}

/// Small per-origin tie-breaker: a direct-host stream needs no further
/// resolution step to become playable, so it gets a nudge over an
/// equivalently-scored torrent candidate.
fn type_bonus_bucket(origin: Origin) -> i64 {
    match origin {
        Origin::DirectHost => 5,
        Origin::TorrentIndexA | Origin::TorrentIndexB => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidate(origin: Origin) -> CandidateStream {
        CandidateStream::new(origin, Some("a".repeat(40)), None).unwrap()
    }

    #[rstest]
    #[case(DeviceClass::Tv, Codec::H265, -60)]
    #[case(DeviceClass::Mobile, Codec::H265, 10)]
    #[case(DeviceClass::Web, Codec::H265, 5)]
    #[case(DeviceClass::Tv, Codec::H264, 40)]
    fn codec_points_match_device_table(#[case] device: DeviceClass, #[case] codec: Codec, #[case] expected: i64) {
        let points = quality_bucket(device, 0, &std::collections::BTreeSet::new(), codec);
        assert_eq!(points, expected);
    }

    #[test]
    fn zero_seeders_effectively_excludes() {
        assert_eq!(seeders_bucket(0), -1000);
        assert_eq!(seeders_bucket(10), 0);
    }

    #[test]
    fn missing_cookie_heavily_demotes_direct_host() {
        let c = candidate(Origin::DirectHost);
        let ctx = ScoringContext { cookie_present: false, ..Default::default() };
        let breakdown = score(&c, DeviceClass::Web, ctx, &ScoringConfig::default());
        assert!(breakdown.cookie_bonus < 0);
    }

    #[test]
    fn cookie_present_gives_small_bonus() {
        let c = candidate(Origin::DirectHost);
        let ctx = ScoringContext { cookie_present: true, ..Default::default() };
        let breakdown = score(&c, DeviceClass::Web, ctx, &ScoringConfig::default());
        assert_eq!(breakdown.cookie_bonus, 3);
    }

    #[test]
    fn torrent_with_debrid_gets_host_bonus() {
        let c = candidate(Origin::TorrentIndexA);
        let ctx = ScoringContext { debrid_available: true, ..Default::default() };
        let breakdown = score(&c, DeviceClass::Web, ctx, &ScoringConfig::default());
        assert_eq!(breakdown.host_bonus, 30);
    }

    #[test]
    fn reliability_penalty_subtracts_from_total() {
        let c = candidate(Origin::TorrentIndexA);
        let low_penalty = ScoringContext { reliability_penalty: 0, ..Default::default() };
        let high_penalty = ScoringContext { reliability_penalty: 200, ..Default::default() };
        let a = score(&c, DeviceClass::Web, low_penalty, &ScoringConfig::default());
        let b = score(&c, DeviceClass::Web, high_penalty, &ScoringConfig::default());
        assert_eq!(a.total - b.total, 200);
    }
}
