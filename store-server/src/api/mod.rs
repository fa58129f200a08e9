//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`customers`] - customer management
//! - [`products`] - product management
//! - [`orders`] - order submission and status transitions

pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

/// Assemble the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(customers::router())
        .merge(products::router())
        .merge(orders::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
