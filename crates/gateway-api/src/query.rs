//! Listing query parameter parsing and validation.

use std::collections::HashMap;

use gateway_core::model::Origin;

use crate::error::ApiError;
use crate::middleware::validation::{is_valid_api_key, is_valid_cookie, sanitize_free_text};
use crate::state::AppState;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
/// Below this, a bare integer `max_size` is read as a GB count rather than
/// a literal byte count — in practice nobody passes a byte-precise limit
/// under a gibibyte, and every addon client that sends this parameter
/// sends a small whole number of gigabytes.
const GB_HEURISTIC_THRESHOLD: u64 = 1024;

/// A debrid provider key selected for this request, never cached or
/// defaulted beyond the lifetime of the request that carried it.
#[derive(Debug, Clone)]
pub struct DebridSelection {
    pub tag: &'static str,
    pub key: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    pub debrid: Option<DebridSelection>,
    pub additional_stream: bool,
    pub max_size_bytes: Option<u64>,
    pub lang_prio: Vec<String>,
    pub lang_strict: bool,
    pub blacklist: Vec<String>,
    pub enable_direct_host: bool,
    pub cookie: Option<String>,
    pub label_origin: bool,
    pub only: Option<Origin>,
    pub resolve_all: bool,
    pub debug: bool,
}

fn flag(params: &HashMap<String, String>, keys: &[&str]) -> bool {
    keys.iter().any(|k| params.get(*k).map(String::as_str) == Some("1"))
}

fn first_present<'a>(params: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| params.get(*k)).map(String::as_str)
}

/// Deterministic priority when more than one debrid key is supplied:
/// `AD > RD > PM > TB > OC`.
fn parse_debrid(params: &HashMap<String, String>) -> Result<Option<DebridSelection>, ApiError> {
    const CANDIDATES: &[(&str, &[&str])] = &[
        ("AD", &["ad", "apikey", "alldebrid"]),
        ("RD", &["rd", "realdebrid"]),
        ("PM", &["pm", "premiumize"]),
        ("TB", &["tb", "torbox"]),
        ("OC", &["oc", "offcloud"]),
    ];

    for (tag, keys) in CANDIDATES {
        if let Some(raw) = first_present(params, keys) {
            if !is_valid_api_key(raw) {
                return Err(ApiError::bad_request(format!("invalid {tag} key")));
            }
            return Ok(Some(DebridSelection { tag, key: raw.to_string() }));
        }
    }

    Ok(None)
}

fn parse_max_size(params: &HashMap<String, String>) -> Result<Option<u64>, ApiError> {
    let Some(raw) = params.get("max_size") else { return Ok(None) };
    if raw.contains('.') {
        let gb: f64 = raw.parse().map_err(|_| ApiError::bad_request("invalid max_size"))?;
        if gb <= 0.0 {
            return Ok(None);
        }
        return Ok(Some((gb * BYTES_PER_GIB) as u64));
    }

    let value: u64 = raw.parse().map_err(|_| ApiError::bad_request("invalid max_size"))?;
    if value == 0 {
        return Ok(None);
    }
    if value < GB_HEURISTIC_THRESHOLD {
        return Ok(Some((value as f64 * BYTES_PER_GIB) as u64));
    }
    Ok(Some(value))
}

fn parse_csv(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|raw| {
            sanitize_free_text(raw)
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_only(params: &HashMap<String, String>) -> Result<Option<Origin>, ApiError> {
    match params.get("only").map(String::as_str) {
        None => Ok(None),
        Some("torrentio") => Ok(Some(Origin::TorrentIndexA)),
        Some("tpb") => Ok(Some(Origin::TorrentIndexB)),
        Some("nuvio") => Ok(Some(Origin::DirectHost)),
        Some(_) => Err(ApiError::bad_request("unrecognized 'only' source")),
    }
}

pub fn parse_listing_options(params: &HashMap<String, String>) -> Result<ListingOptions, ApiError> {
    let cookie = first_present(params, &["nuvio_cookie", "dcookie", "cookie"])
        .map(str::to_string)
        .filter(|c| !c.is_empty());
    if let Some(cookie) = &cookie {
        if !is_valid_cookie(cookie) {
            return Err(ApiError::bad_request("invalid cookie"));
        }
    }

    Ok(ListingOptions {
        debrid: parse_debrid(params)?,
        additional_stream: flag(params, &["fallback", "additionalstream"]),
        max_size_bytes: parse_max_size(params)?,
        lang_prio: parse_csv(params, "lang_prio"),
        lang_strict: flag(params, &["lang_strict"]),
        blacklist: parse_csv(params, "blacklist"),
        enable_direct_host: flag(params, &["nuvio", "include_nuvio", "dhosts"]),
        cookie,
        label_origin: flag(params, &["label_origin"]),
        only: parse_only(params)?,
        resolve_all: flag(params, &["debridAll", "resolveAll"]),
        debug: flag(params, &["debug"]),
    })
}

/// Cache key for the final-response cache: pathname plus every option
/// that can change the resulting payload. Debrid *keys* are deliberately
/// excluded - only the provider tag participates, so the key never
/// carries a secret.
#[must_use]
pub fn cache_key(pathname: &str, options: &ListingOptions) -> String {
    format!(
        "{pathname}|debrid={}|fallback={}|resolveAll={}|only={:?}|label={}",
        options.debrid.as_ref().map_or("-", |d| d.tag),
        options.additional_stream,
        options.resolve_all,
        options.only,
        options.label_origin,
    )
}

/// Validates a debrid key via the provider's cheap probe endpoint, cached
/// for five minutes per `(tag, key)` pair. Shared by the manifest route
/// and the listing orchestrator so both agree on whether a key "counts".
pub async fn validate_debrid(state: &AppState, selection: &DebridSelection) -> bool {
    let cache_key = (selection.tag.to_string(), selection.key.clone());
    if let Some(cached) = state.provider_probe_cache.get(&cache_key).await {
        return cached;
    }
    let valid = match state.debrid.get(selection.tag) {
        Some(resolver) => resolver.validate_key(&selection.key).await,
        None => false,
    };
    state.provider_probe_cache.set(cache_key, valid).await;
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn debrid_priority_prefers_ad_over_rd() {
        let p = params(&[("ad", "abc123"), ("rd", "def456")]);
        let selection = parse_debrid(&p).unwrap().unwrap();
        assert_eq!(selection.tag, "AD");
    }

    #[test]
    fn rejects_unsafe_api_key_characters() {
        let p = params(&[("ad", "abc 123")]);
        assert!(parse_debrid(&p).is_err());
    }

    #[test]
    fn max_size_zero_means_unlimited() {
        let p = params(&[("max_size", "0")]);
        assert_eq!(parse_max_size(&p).unwrap(), None);
    }

    #[test]
    fn max_size_small_integer_is_read_as_gigabytes() {
        let p = params(&[("max_size", "15")]);
        assert_eq!(parse_max_size(&p).unwrap(), Some(15 * 1024 * 1024 * 1024));
    }

    #[test]
    fn max_size_float_is_read_as_gigabytes() {
        let p = params(&[("max_size", "14.2")]);
        let bytes = parse_max_size(&p).unwrap().unwrap();
        assert_eq!(bytes, (14.2 * BYTES_PER_GIB) as u64);
    }

    #[test]
    fn only_maps_known_sources() {
        let p = params(&[("only", "nuvio")]);
        assert_eq!(parse_only(&p).unwrap(), Some(Origin::DirectHost));
    }

    #[test]
    fn only_rejects_unknown_sources() {
        let p = params(&[("only", "bogus")]);
        assert!(parse_only(&p).is_err());
    }
}
