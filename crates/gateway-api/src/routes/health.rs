//! Liveness endpoints.

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "autostream-gateway" }))
}

pub async fn ping() -> &'static str {
    "pong"
}
