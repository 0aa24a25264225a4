//! `GET /manifest.json`.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::query::{parse_listing_options, validate_debrid};
use crate::state::AppState;

const BASE_NAME: &str = "AutoStream";

pub async fn manifest(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let options = parse_listing_options(&params).unwrap_or_default();

    let mut name = BASE_NAME.to_string();
    if let Some(selection) = &options.debrid {
        if validate_debrid(&state, selection).await {
            name = format!("{BASE_NAME} ({})", selection.tag);
        }
    }

    Json(json!({
        "id": "org.autostream.gateway",
        "version": "1.0.0",
        "name": name,
        "description": "Aggregated stream listings with optional debrid resolution",
        "resources": ["stream"],
        "types": ["movie", "series"],
        "idPrefixes": ["tt", "tmdb"],
        "catalogs": [],
    }))
}
