//! `GET /play` — click-time debrid redirect.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use gateway_providers::debrid::{ResolveOptions, ResolveTarget, SeriesMeta};

use crate::error::{ApiError, ApiResult};
use crate::middleware::validation::{is_valid_api_key, is_valid_file_index, is_valid_imdb_id, is_valid_info_hash, is_valid_series_id};
use crate::state::AppState;

const PROVIDER_TAGS: &[(&str, &str)] = &[("ad", "AD"), ("rd", "RD"), ("pm", "PM"), ("tb", "TB"), ("oc", "OC")];

fn identify_provider(params: &HashMap<String, String>) -> Result<(&'static str, String), ApiError> {
    for &(query_key, tag) in PROVIDER_TAGS {
        if let Some(key) = params.get(query_key) {
            if !is_valid_api_key(key) {
                return Err(ApiError::bad_request("invalid provider key"));
            }
            return Ok((tag, key.clone()));
        }
    }
    Err(ApiError::bad_request("no recognized debrid provider key supplied"))
}

fn parse_series_meta(imdb: &str) -> Option<SeriesMeta> {
    let mut parts = imdb.splitn(3, ':');
    let _base = parts.next()?;
    let season: u32 = parts.next()?.parse().ok()?;
    let episode: u32 = parts.next()?.parse().ok()?;
    Some(SeriesMeta { season, episode })
}

pub async fn play(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult<Response> {
    let ih = params.get("ih").ok_or_else(|| ApiError::bad_request("missing 'ih'"))?;
    if !is_valid_info_hash(ih) {
        return Err(ApiError::bad_request("invalid info hash"));
    }

    let file_index = match params.get("idx") {
        Some(raw) if !raw.is_empty() => {
            if !is_valid_file_index(raw) {
                return Err(ApiError::bad_request("invalid file index"));
            }
            Some(raw.parse().expect("validated above"))
        }
        _ => None,
    };

    let imdb = params.get("imdb").ok_or_else(|| ApiError::bad_request("missing 'imdb'"))?;
    if !is_valid_imdb_id(imdb) && !is_valid_series_id(imdb) {
        return Err(ApiError::bad_request("invalid 'imdb' shape"));
    }

    let (tag, key) = identify_provider(&params)?;
    let resolver = state
        .debrid
        .get(tag)
        .ok_or_else(|| ApiError::not_found("provider not configured on this gateway"))?;

    let opts = ResolveOptions { file_index, series: parse_series_meta(imdb) };
    let target = ResolveTarget::InfoHash(ih.clone());
    let attempted_host = format!("debrid:{tag}");

    match resolver.resolve(target, &key, opts).await {
        Ok(Some(direct_url)) => {
            if let Some(host) = direct_url.host_str() {
                state.reliability.on_ok(host);
            }
            state.metrics.debrid_outcomes.with_label_values(&[tag, "ok"]).inc();
            Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, direct_url.as_str())
                .header(header::CACHE_CONTROL, "private, max-age=300")
                .body(Body::empty())
                .map_err(|err| ApiError::internal(err.to_string()))
        }
        Ok(None) => {
            state.reliability.on_fail(&attempted_host);
            state.metrics.debrid_outcomes.with_label_values(&[tag, "no_files"]).inc();
            Err(ApiError::not_found("no playable files"))
        }
        Err(err) => {
            state.reliability.on_fail(&attempted_host);
            state.metrics.debrid_outcomes.with_label_values(&[tag, "error"]).inc();
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_first_present_provider_key_in_priority_order() {
        let mut params = HashMap::new();
        params.insert("rd".to_string(), "abc123".to_string());
        params.insert("oc".to_string(), "def456".to_string());
        let (tag, key) = identify_provider(&params).unwrap();
        assert_eq!(tag, "RD");
        assert_eq!(key, "abc123");
    }

    #[test]
    fn rejects_when_no_provider_key_present() {
        let params = HashMap::new();
        assert!(identify_provider(&params).is_err());
    }

    #[test]
    fn parses_season_and_episode_from_series_imdb_shape() {
        let meta = parse_series_meta("tt1234567:3:6").unwrap();
        assert_eq!(meta.season, 3);
        assert_eq!(meta.episode, 6);
    }

    #[test]
    fn movie_shape_has_no_series_meta() {
        assert!(parse_series_meta("tt1234567").is_none());
    }
}
