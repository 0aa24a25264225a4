//! `GET /stream/{type}/{id}.json` — the main listing orchestrator.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{self, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use gateway_core::model::{CandidateStream, DeviceClass, Origin};
use gateway_core::scorer::{self, ScoringContext};
use gateway_core::{classifier, device, filters, selector};
use gateway_providers::traits::{ContentKind, ContentQuery};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::middleware::validation::{is_valid_imdb_id, is_valid_series_id};
use crate::preload::schedule_preload;
use crate::query::{cache_key, parse_listing_options, validate_debrid, DebridSelection, ListingOptions};
use crate::state::{AppState, CachedListing};

const PROVIDER_DEADLINE: Duration = Duration::from_secs(4);
const ORCHESTRATOR_DEADLINE: Duration = Duration::from_secs(6);
const NO_STREAMS_URL: &str = "https://github.com/autostream-gateway#no-streams-available";
const STALE_REVALIDATE_SECS: u64 = 14_400;
const STALE_ERROR_SECS: u64 = 604_800;
const MIN_CACHE_MAX_AGE_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize)]
struct ProxyHeaders {
    #[serde(rename = "Cookie", skip_serializing_if = "Option::is_none")]
    cookie: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct BehaviorHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(rename = "proxyHeaders", skip_serializing_if = "Option::is_none")]
    proxy_headers: Option<ProxyHeaders>,
}

#[derive(Debug, Clone, Serialize)]
struct StreamDto {
    name: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(rename = "infoHash", skip_serializing_if = "Option::is_none")]
    info_hash: Option<String>,
    #[serde(rename = "fileIdx", skip_serializing_if = "Option::is_none")]
    file_idx: Option<u32>,
    #[serde(rename = "behaviorHints", skip_serializing_if = "Option::is_none")]
    behavior_hints: Option<BehaviorHints>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    streams: Vec<StreamDto>,
    #[serde(rename = "cacheMaxAge")]
    cache_max_age: u64,
    #[serde(rename = "staleRevalidate")]
    stale_revalidate: u64,
    #[serde(rename = "staleError")]
    stale_error: u64,
}

/// Content id shape: `tt1234567` for movies, `tt1234567:season:episode`
/// for episodes.
struct ParsedId {
    imdb_id: String,
    season: Option<u32>,
    episode: Option<u32>,
}

fn parse_content_id(kind: ContentKind, raw: &str) -> Result<ParsedId, ApiError> {
    match kind {
        ContentKind::Movie => {
            if !is_valid_imdb_id(raw) {
                return Err(ApiError::bad_request("invalid movie id"));
            }
            Ok(ParsedId { imdb_id: raw.to_string(), season: None, episode: None })
        }
        ContentKind::Series => {
            if !is_valid_series_id(raw) {
                return Err(ApiError::bad_request("invalid series id"));
            }
            let mut parts = raw.splitn(3, ':');
            let imdb_id = parts.next().unwrap_or_default().to_string();
            let season = parts.next().and_then(|s| s.parse().ok());
            let episode = parts.next().and_then(|e| e.parse().ok());
            Ok(ParsedId { imdb_id, season, episode })
        }
    }
}

fn quality_label(resolution: u32) -> &'static str {
    match resolution {
        2160 => "4K",
        1440 => "2K",
        1080 => "1080p",
        720 => "720p",
        480 => "480p",
        _ => "SD",
    }
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
}

fn play_query_key(tag: &str) -> &'static str {
    match tag {
        "AD" => "ad",
        "RD" => "rd",
        "PM" => "pm",
        "TB" => "tb",
        _ => "oc",
    }
}

fn enabled_origins(options: &ListingOptions) -> Vec<Origin> {
    if let Some(only) = options.only {
        return vec![only];
    }
    let mut origins = vec![Origin::TorrentIndexA, Origin::TorrentIndexB];
    if options.enable_direct_host {
        origins.push(Origin::DirectHost);
    }
    origins
}

async fn fetch_candidates(state: &AppState, query: &ContentQuery, origins: &[Origin]) -> Vec<CandidateStream> {
    let providers = state.providers.enabled(Some(origins));
    let mut join_set = tokio::task::JoinSet::new();
    for (idx, provider) in providers.iter().cloned().enumerate() {
        let query = query.clone();
        join_set.spawn(async move { (idx, provider.fetch(&query, PROVIDER_DEADLINE).await) });
    }

    let mut results: Vec<Option<Vec<CandidateStream>>> = vec![None; providers.len()];
    let _ = tokio::time::timeout(ORCHESTRATOR_DEADLINE, async {
        while let Some(joined) = join_set.join_next().await {
            if let Ok((idx, list)) = joined {
                results[idx] = Some(list);
            }
        }
    })
    .await;
    join_set.abort_all();

    for (origin, count) in providers.iter().map(|p| p.origin()).zip(results.iter().map(|r| r.as_ref().map_or(0, Vec::len))) {
        state.metrics.candidates_fetched.with_label_values(&[origin.tag()]).inc_by(count as u64);
    }

    results.into_iter().flatten().flatten().collect()
}

fn finalize_candidate(
    mut candidate: CandidateStream,
    label_origin: bool,
    debrid: Option<(&DebridSelection, bool)>,
    content_id: &str,
    season: Option<u32>,
    episode: Option<u32>,
) -> StreamDto {
    let mut name = "AutoStream".to_string();
    let mut info_hash = None;
    let mut file_idx = candidate.file_index;
    let mut url = candidate.http_url.clone();

    if candidate.is_torrent() {
        match debrid {
            Some((selection, true)) => {
                let hash = candidate.info_hash.clone().unwrap_or_default();
                let idx = candidate.file_index.unwrap_or(0);
                url = Some(format!(
                    "/play?ih={hash}&idx={idx}&imdb={content_id}&{}={}",
                    play_query_key(selection.tag),
                    selection.key
                ));
                name = format!("AutoStream ({})", selection.tag);
            }
            _ => {
                info_hash = candidate.info_hash.clone();
                file_idx = candidate.file_index;
                url = None;
            }
        }
    }

    if label_origin {
        name = format!("[{}] {name}", candidate.origin.tag());
    }

    let quality = quality_label(candidate.features.resolution);
    let title = match (season, episode) {
        (Some(s), Some(e)) => format!("{content_id} — S{s:02}E{e:02} – {quality}"),
        _ => format!("{content_id} – {quality}"),
    };

    let cookie = candidate.proxy_headers.remove("Cookie");
    let behavior_hints = if cookie.is_some() {
        Some(BehaviorHints { filename: None, proxy_headers: Some(ProxyHeaders { cookie }) })
    } else {
        None
    };

    StreamDto { name, title, url, info_hash, file_idx, behavior_hints }
}

fn synthetic_no_streams_response(config_cache_max_age: u64) -> ListingResponse {
    ListingResponse {
        streams: vec![StreamDto {
            name: "AutoStream".to_string(),
            title: "No streams available".to_string(),
            url: Some(NO_STREAMS_URL.to_string()),
            info_hash: None,
            file_idx: None,
            behavior_hints: None,
        }],
        cache_max_age: config_cache_max_age,
        stale_revalidate: STALE_REVALIDATE_SECS,
        stale_error: STALE_ERROR_SECS,
    }
}

/// Runs the full fan-out -> classify -> filter -> score -> select ->
/// finalize pipeline. Shared by the live route handler and background
/// episode preloading.
pub async fn compute_listing(
    state: &AppState,
    kind: ContentKind,
    content_id: &str,
    device_class: DeviceClass,
    options: &ListingOptions,
) -> ListingResponse {
    let parsed = parse_content_id(kind, content_id).unwrap_or(ParsedId {
        imdb_id: content_id.to_string(),
        season: None,
        episode: None,
    });

    let debrid_valid = match &options.debrid {
        Some(selection) => validate_debrid(state, selection).await,
        None => false,
    };

    let content_query = ContentQuery {
        kind,
        imdb_id: parsed.imdb_id.clone(),
        season: parsed.season,
        episode: parsed.episode,
        cookie: options.cookie.clone(),
    };

    let origins = enabled_origins(options);
    let mut candidates = fetch_candidates(state, &content_query, &origins).await;

    for candidate in &mut candidates {
        let explicit_size = (candidate.features.bytes != 0).then_some(candidate.features.bytes);
        candidate.features = classifier::classify(
            &candidate.name,
            &candidate.title,
            &candidate.description,
            None,
            explicit_size,
            None,
        );
    }

    if let Some(max_bytes) = options.max_size_bytes {
        candidates = filters::filter_max_size(candidates, max_bytes);
    }
    let mut blacklist = state.config.filters.blacklist_terms.clone();
    blacklist.extend(options.blacklist.iter().cloned());
    candidates = filters::filter_blacklist(candidates, &blacklist);
    if options.lang_strict {
        candidates = filters::filter_strict_language(candidates, &options.lang_prio);
    }

    if candidates.is_empty() {
        state.metrics.candidates_dropped.with_label_values(&["empty_after_filters"]).inc();
        return synthetic_no_streams_response(state.config.cache.final_response_ttl_secs);
    }

    let scoring_config = &state.config.scoring;
    for candidate in &mut candidates {
        let host = candidate.http_url.as_deref().and_then(host_of);
        let reliability_penalty = host.as_deref().map_or(0, |h| state.reliability.penalty(h));
        let ctx = ScoringContext {
            host: host.as_deref(),
            reliability_penalty,
            cookie_present: !candidate.proxy_headers.is_empty(),
            debrid_available: debrid_valid,
        };
        candidate.score = Some(scorer::score(candidate, device_class, ctx, scoring_config));
        state.metrics.candidates_scored.inc();
    }

    let selection = selector::select(candidates);
    let debrid_selection = options.debrid.as_ref();

    let mut streams = Vec::new();
    if let Some(primary) = selection.primary {
        streams.push(finalize_candidate(
            primary,
            options.label_origin,
            debrid_selection.map(|s| (s, debrid_valid)),
            content_id,
            parsed.season,
            parsed.episode,
        ));
    }
    if options.additional_stream {
        if let Some(secondary) = selection.secondary {
            // Secondary only gets a debrid-backed link when the caller asked
            // to resolve more than the top candidate; otherwise it's left as
            // a bare magnet/hash for an external torrent client to pick up,
            // which keeps the default request cheap against debrid rate limits.
            let secondary_debrid = debrid_selection.map(|s| (s, debrid_valid && options.resolve_all));
            streams.push(finalize_candidate(
                secondary,
                options.label_origin,
                secondary_debrid,
                content_id,
                parsed.season,
                parsed.episode,
            ));
        }
    }

    streams.truncate(state.config.server.max_returned_streams);

    let mut cache_max_age = state.config.cache.final_response_ttl_secs;
    if state.reliability.has_any_penalty() {
        cache_max_age = (cache_max_age / 2).max(MIN_CACHE_MAX_AGE_SECS);
    }

    ListingResponse { streams, cache_max_age, stale_revalidate: STALE_REVALIDATE_SECS, stale_error: STALE_ERROR_SECS }
}

fn device_from_headers(headers: &HeaderMap) -> DeviceClass {
    let ua = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default();
    device::classify_device(ua)
}

pub async fn stream_typed(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<Json<ListingResponse>> {
    let kind = match kind.as_str() {
        "movie" => ContentKind::Movie,
        "series" => ContentKind::Series,
        _ => return Err(ApiError::bad_request("type must be 'movie' or 'series'")),
    };
    let id = id.strip_suffix(".json").unwrap_or(&id).to_string();
    parse_content_id(kind, &id)?;

    let options = parse_listing_options(&params)?;
    let device_class = device_from_headers(&headers);
    let path = format!("/stream/{}/{id}.json", if kind == ContentKind::Movie { "movie" } else { "series" });
    let key = cache_key(&path, &options);

    if !options.debug {
        if let Some(cached) = state.final_response_cache.get(&key).await {
            state.metrics.cache_hits.with_label_values(&["final_response"]).inc();
            let response: ListingResponse = serde_json::from_value(cached.body)
                .map_err(|err| ApiError::internal(err.to_string()))?;
            return Ok(Json(response));
        }
        state.metrics.cache_misses.with_label_values(&["final_response"]).inc();
    }

    let response = compute_listing(&state, kind, &id, device_class, &options).await;

    if !options.debug {
        if let Ok(body) = serde_json::to_value(&response) {
            state.final_response_cache.set(key, CachedListing { body }).await;
        }
    }

    if kind == ContentKind::Series {
        schedule_preload(&state, &id, &options);
    }

    Ok(Json(response))
}

pub async fn stream_compat(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let bare = id.strip_suffix(".json").unwrap_or(&id);
    let kind = if bare.contains(':') { "series" } else { "movie" };

    let query_string = if params.is_empty() {
        String::new()
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &params {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    };
    let suffix = if query_string.is_empty() { String::new() } else { format!("?{query_string}") };

    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, format!("/stream/{kind}/{bare}.json{suffix}"))
        .body(Body::empty())
        .map_err(|err| ApiError::internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_series_id_components() {
        let parsed = parse_content_id(ContentKind::Series, "tt1234567:3:6").unwrap();
        assert_eq!(parsed.imdb_id, "tt1234567");
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, Some(6));
    }

    #[test]
    fn rejects_malformed_movie_id() {
        assert!(parse_content_id(ContentKind::Movie, "nm1234567").is_err());
    }

    #[test]
    fn quality_labels_match_known_resolutions() {
        assert_eq!(quality_label(2160), "4K");
        assert_eq!(quality_label(1080), "1080p");
        assert_eq!(quality_label(999), "SD");
    }
}
