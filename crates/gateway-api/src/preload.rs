//! Background next-episode preload.
//!
//! Fire-and-forget: spawned on its own task with its own deadline, never
//! awaited by the request that triggered it, and never allowed to fail the
//! response that's already on its way back to the client.

use gateway_providers::traits::ContentKind;

use crate::query::{cache_key, ListingOptions};
use crate::routes::stream::compute_listing;
use crate::state::{AppState, CachedListing};

/// If `content_id` is a series episode, schedules a background fetch of
/// episode N+1 under its own cache key so the next click is warm.
pub fn schedule_preload(state: &AppState, content_id: &str, options: &ListingOptions) {
    let Some((imdb_id, season, episode)) = split_series_id(content_id) else { return };
    let Some(next_episode) = episode.checked_add(1) else { return };

    let state = state.clone();
    let options = options.clone();
    let next_id = format!("{imdb_id}:{season}:{next_episode}");

    tokio::spawn(async move {
        let device = gateway_core::model::DeviceClass::Web;
        let response = compute_listing(&state, ContentKind::Series, &next_id, device, &options).await;

        let path = format!("/stream/series/{next_id}.json");
        let key = cache_key(&path, &options);
        if let Ok(body) = serde_json::to_value(&response) {
            state.final_response_cache.set(key, CachedListing { body }).await;
        }
    });
}

fn split_series_id(content_id: &str) -> Option<(String, u32, u32)> {
    let mut parts = content_id.splitn(3, ':');
    let imdb_id = parts.next()?.to_string();
    let season: u32 = parts.next()?.parse().ok()?;
    let episode: u32 = parts.next()?.parse().ok()?;
    Some((imdb_id, season, episode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_well_formed_series_id() {
        let (imdb, season, episode) = split_series_id("tt1234567:3:6").unwrap();
        assert_eq!(imdb, "tt1234567");
        assert_eq!(season, 3);
        assert_eq!(episode, 6);
    }

    #[test]
    fn rejects_movie_id() {
        assert!(split_series_id("tt1234567").is_none());
    }
}
