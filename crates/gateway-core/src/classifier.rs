//! Feature classifier.
//!
//! A single pass over a candidate's combined free text extracts resolution,
//! codec, container, HDR flags, size, seeders, languages and release group
//! using case-insensitive token matches. Ties within one feature are broken
//! by first-match order; unmatched features stay `Unknown`/empty rather than
//! being guessed.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::model::{CandidateFeatures, Codec, Container, HdrFlag, SourceQuality};

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("classifier regex is valid")
}

static RES_2160: Lazy<Regex> = Lazy::new(|| ci(r"2160p|4k|uhd"));
static RES_1440: Lazy<Regex> = Lazy::new(|| ci(r"1440p|2k|qhd"));
static RES_1080: Lazy<Regex> = Lazy::new(|| ci(r"1080p|fhd"));
static RES_720: Lazy<Regex> = Lazy::new(|| ci(r"720p|\bhd\b"));
static RES_480: Lazy<Regex> = Lazy::new(|| ci(r"480p|\bsd\b"));

static CODEC_H265: Lazy<Regex> = Lazy::new(|| ci(r"x265|hevc|h\.?265"));
static CODEC_H264: Lazy<Regex> = Lazy::new(|| ci(r"x264|avc|h\.?264"));

static CONTAINER_MP4: Lazy<Regex> = Lazy::new(|| ci(r"\.mp4\b"));
static CONTAINER_MKV: Lazy<Regex> = Lazy::new(|| ci(r"\.mkv\b"));
static CONTAINER_AVI: Lazy<Regex> = Lazy::new(|| ci(r"\.avi\b"));

static HDR10_PLUS: Lazy<Regex> = Lazy::new(|| ci(r"hdr10\+"));
static DOLBY_VISION: Lazy<Regex> = Lazy::new(|| ci(r"dolby[ .]?vision|\bdv\b"));
static HDR_PLAIN: Lazy<Regex> = Lazy::new(|| ci(r"\bhdr\b"));
static TEN_BIT: Lazy<Regex> = Lazy::new(|| ci(r"10[ .]?bit|hi10p"));

static SOURCE_BLURAY: Lazy<Regex> = Lazy::new(|| ci(r"blu-?ray|bdrip|brrip|remux"));
static SOURCE_WEBDL: Lazy<Regex> = Lazy::new(|| ci(r"web-?dl|webrip"));
static SOURCE_HDTV: Lazy<Regex> = Lazy::new(|| ci(r"hdtv"));

static SIZE_RE: Lazy<Regex> = Lazy::new(|| ci(r"([\d.]+)\s*(TB|GB|MB|KB|B)\b"));
static TRAILING_SEEDERS_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| ci(r"(\d+)\s+([\d.]+)\s*(TB|GB|MB|KB|B)\s*$"));

static RELEASE_GROUP_RE: Lazy<Regex> = Lazy::new(|| ci(r"(?:-([A-Za-z0-9]+)|\[([A-Za-z0-9]+)\])\s*$"));

/// `(tag, pattern)`. `"PT"` is the *generic* Portuguese pattern; it is
/// normalized to `PT-PT`/`PT-BR` in a post-processing step below rather than
/// emitted directly.
static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("EN", ci(r"\b(en|eng|english)\b")),
        ("FR", ci(r"\b(fr|fre|french|vff?|vfq)\b")),
        ("DE", ci(r"\b(de|ger|german)\b")),
        ("ES", ci(r"\b(es|spa|spanish|castellano)\b")),
        ("IT", ci(r"\b(it|ita|italian)\b")),
        ("PT-BR", ci(r"\bpt-?br\b|brazilian")),
        ("PT", ci(r"\b(pt|por|portuguese)\b")),
        ("RU", ci(r"\b(ru|rus|russian)\b")),
        ("JA", ci(r"\b(ja|jpn|japanese)\b")),
        ("KO", ci(r"\b(ko|kor|korean)\b")),
        ("ZH", ci(r"\b(zh|chi|chinese|mandarin)\b")),
        ("NL", ci(r"\b(nl|dut|dutch)\b")),
        ("PL", ci(r"\b(pl|pol|polish)\b")),
        ("HI", ci(r"\b(hi|hin|hindi)\b")),
    ]
});

static LANGUAGE_FLAGS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("🇬🇧", "EN"),
        ("🇺🇸", "EN"),
        ("🇫🇷", "FR"),
        ("🇩🇪", "DE"),
        ("🇪🇸", "ES"),
        ("🇮🇹", "IT"),
        ("🇧🇷", "PT-BR"),
        ("🇵🇹", "PT"),
        ("🇷🇺", "RU"),
        ("🇯🇵", "JA"),
        ("🇰🇷", "KO"),
        ("🇨🇳", "ZH"),
        ("🇳🇱", "NL"),
        ("🇵🇱", "PL"),
        ("🇮🇳", "HI"),
    ]
});

fn unit_multiplier(unit: &str) -> u64 {
    match unit.to_uppercase().as_str() {
        "TB" => 1024u64.pow(4),
        "GB" => 1024u64.pow(3),
        "MB" => 1024u64.pow(2),
        "KB" => 1024,
        _ => 1,
    }
}

/// Extract every feature from a candidate's combined text.
///
/// `explicit_size_bytes` / `explicit_seeders` are structured values the
/// upstream already set (e.g. an indexer's dedicated `size`/`seeders`
/// fields); when present they take priority over text scanning.
#[must_use]
pub fn classify(
    name: &str,
    title: &str,
    description: &str,
    filename: Option<&str>,
    explicit_size_bytes: Option<u64>,
    explicit_seeders: Option<u32>,
) -> CandidateFeatures {
    let mut text = format!("{name} {title} {description}");
    if let Some(f) = filename {
        text.push(' ');
        text.push_str(f);
    }

    let trailing = TRAILING_SEEDERS_SIZE_RE.captures(text.trim_end());

    CandidateFeatures {
        resolution: classify_resolution(&text),
        codec: classify_codec(&text),
        container: classify_container(&text),
        source: classify_source(&text),
        bytes: explicit_size_bytes.unwrap_or_else(|| classify_size(&text, trailing.as_ref())),
        languages: classify_languages(&text),
        seeders: explicit_seeders.unwrap_or_else(|| classify_seeders(trailing.as_ref())),
        release_group: classify_release_group(name),
        hdr_flags: classify_hdr(&text),
    }
}

fn classify_resolution(text: &str) -> u32 {
    if RES_2160.is_match(text) {
        2160
    } else if RES_1440.is_match(text) {
        1440
    } else if RES_1080.is_match(text) {
        1080
    } else if RES_720.is_match(text) {
        720
    } else if RES_480.is_match(text) {
        480
    } else {
        0
    }
}

fn classify_codec(text: &str) -> Codec {
    if CODEC_H265.is_match(text) {
        Codec::H265
    } else if CODEC_H264.is_match(text) {
        Codec::H264
    } else {
        Codec::Unknown
    }
}

fn classify_container(text: &str) -> Container {
    if CONTAINER_MP4.is_match(text) {
        Container::Mp4
    } else if CONTAINER_MKV.is_match(text) {
        Container::Mkv
    } else if CONTAINER_AVI.is_match(text) {
        Container::Avi
    } else {
        Container::Unknown
    }
}

fn classify_source(text: &str) -> SourceQuality {
    if SOURCE_BLURAY.is_match(text) {
        SourceQuality::BlurayRemux
    } else if SOURCE_WEBDL.is_match(text) {
        SourceQuality::WebDl
    } else if SOURCE_HDTV.is_match(text) {
        SourceQuality::Hdtv
    } else {
        SourceQuality::Unknown
    }
}

fn classify_hdr(text: &str) -> BTreeSet<HdrFlag> {
    let mut flags = BTreeSet::new();
    if HDR10_PLUS.is_match(text) {
        flags.insert(HdrFlag::Hdr10Plus);
    }
    if DOLBY_VISION.is_match(text) {
        flags.insert(HdrFlag::DolbyVision);
    }
    if HDR_PLAIN.is_match(text) {
        flags.insert(HdrFlag::Hdr);
    }
    if TEN_BIT.is_match(text) {
        flags.insert(HdrFlag::TenBit);
    }
    flags
}

fn classify_size(text: &str, trailing: Option<&regex::Captures<'_>>) -> u64 {
    if let Some(caps) = SIZE_RE.captures(text) {
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        let unit = &caps[2];
        return (value * unit_multiplier(unit) as f64) as u64;
    }
    if let Some(caps) = trailing {
        let value: f64 = caps[2].parse().unwrap_or(0.0);
        let unit = &caps[3];
        return (value * unit_multiplier(unit) as f64) as u64;
    }
    0
}

fn classify_seeders(trailing: Option<&regex::Captures<'_>>) -> u32 {
    trailing
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

fn classify_languages(text: &str) -> BTreeSet<String> {
    let mut detected = BTreeSet::new();

    for (tag, pattern) in LANGUAGE_PATTERNS.iter() {
        if pattern.is_match(text) {
            detected.insert((*tag).to_string());
        }
    }
    for (flag, tag) in LANGUAGE_FLAGS.iter() {
        if text.contains(flag) {
            detected.insert((*tag).to_string());
        }
    }

    // Normalize the generic "PT" match to PT-PT unless PT-BR was explicitly
    // detected too.
    if detected.remove("PT") && !detected.contains("PT-BR") {
        detected.insert("PT-PT".to_string());
    }

    detected
}

fn classify_release_group(name: &str) -> String {
    RELEASE_GROUP_RE
        .captures(name.trim())
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_2160_from_explicit_token() {
        let f = classify("Movie.2160p.mkv", "", "", None, None, None);
        assert_eq!(f.resolution, 2160);
    }

    #[test]
    fn resolution_2160_from_4k_uhd_alias() {
        let f = classify("Movie 4K UHD", "", "", None, None, None);
        assert_eq!(f.resolution, 2160);
    }

    #[test]
    fn resolution_1080_from_bluray_release() {
        let f = classify("Movie.1080p.BluRay", "", "", None, None, None);
        assert_eq!(f.resolution, 1080);
        assert_eq!(f.source, SourceQuality::BlurayRemux);
    }

    #[test]
    fn unknown_resolution_stays_zero() {
        let f = classify("Movie release with no quality tag", "", "", None, None, None);
        assert_eq!(f.resolution, 0);
    }

    #[test]
    fn size_parses_decimal_gb() {
        let f = classify("Movie 14.2 GB", "", "", None, None, None);
        assert_eq!(f.bytes, (14.2 * 1024f64.powi(3)) as u64);
    }

    #[test]
    fn size_parses_mb() {
        let f = classify("Movie 950 MB", "", "", None, None, None);
        assert_eq!(f.bytes, (950.0 * 1024f64.powi(2)) as u64);
    }

    #[test]
    fn explicit_size_wins_over_text() {
        let f = classify("Movie 950 MB", "", "", None, Some(12345), None);
        assert_eq!(f.bytes, 12345);
    }

    #[test]
    fn seeders_from_trailing_line() {
        let f = classify("Movie name", "", "42 1.5 GB", None, None, None);
        assert_eq!(f.seeders, 42);
        assert_eq!(f.bytes, (1.5 * 1024f64.powi(3)) as u64);
    }

    #[test]
    fn explicit_seeders_wins_over_text() {
        let f = classify("Movie name", "", "42 1.5 GB", None, None, Some(7));
        assert_eq!(f.seeders, 7);
    }

    #[test]
    fn codec_h265_detected() {
        let f = classify("Movie.x265.HEVC", "", "", None, None, None);
        assert_eq!(f.codec, Codec::H265);
    }

    #[test]
    fn codec_h264_detected() {
        let f = classify("Movie.x264.AVC", "", "", None, None, None);
        assert_eq!(f.codec, Codec::H264);
    }

    #[test]
    fn language_pt_normalizes_to_pt_pt_without_pt_br() {
        let f = classify("Movie PT dublado", "", "", None, None, None);
        assert!(f.languages.contains("PT-PT"));
        assert!(!f.languages.contains("PT-BR"));
    }

    #[test]
    fn language_pt_br_explicit_wins() {
        let f = classify("Movie PT-BR dublado", "", "", None, None, None);
        assert!(f.languages.contains("PT-BR"));
        assert!(!f.languages.contains("PT-PT"));
    }

    #[test]
    fn release_group_trailing_dash_token() {
        let f = classify("Movie.2160p.WEB-DL-SPARKS", "", "", None, None, None);
        assert_eq!(f.release_group, "SPARKS");
    }

    #[test]
    fn release_group_bracket_token() {
        let f = classify("Movie.2160p.WEB-DL[GROUP]", "", "", None, None, None);
        assert_eq!(f.release_group, "GROUP");
    }

    #[test]
    fn hdr_flags_collected_independently() {
        let f = classify("Movie 2160p HDR10+ Dolby Vision 10bit", "", "", None, None, None);
        assert!(f.hdr_flags.contains(&HdrFlag::Hdr10Plus));
        assert!(f.hdr_flags.contains(&HdrFlag::DolbyVision));
        assert!(f.hdr_flags.contains(&HdrFlag::TenBit));
    }
}
