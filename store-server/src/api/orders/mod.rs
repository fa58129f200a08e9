//! Order API

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::submit))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
}
