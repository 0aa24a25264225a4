//! Operator endpoints over the reliability store.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let penalties = state.reliability.penalties();
    let count = penalties.len();
    let max = penalties.iter().map(|(_, p)| *p).max().unwrap_or(0);
    let average = if count == 0 {
        0.0
    } else {
        penalties.iter().map(|(_, p)| *p as f64).sum::<f64>() / count as f64
    };

    Json(json!({ "count": count, "max": max, "average": average }))
}

pub async fn penalties(State(state): State<AppState>) -> Json<Value> {
    let map: serde_json::Map<String, Value> = state
        .reliability
        .penalties()
        .into_iter()
        .map(|(host, penalty)| (host, json!(penalty)))
        .collect();
    Json(Value::Object(map))
}

#[derive(Debug, Deserialize, Default)]
pub struct ClearRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Accepts a raw body rather than a typed `Json<T>` extractor: `{}` is a
/// valid "clear everything" request and must not be rejected as malformed.
pub async fn clear(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let request: ClearRequest = serde_json::from_slice(&body).unwrap_or_default();
    match request.url {
        Some(host) => state.reliability.clear(&host),
        None => state.reliability.clear_all(),
    }
    Json(json!({ "cleared": true }))
}
