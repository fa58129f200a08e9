//! Health check

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
