//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;
use rust_decimal::Decimal;

use crate::core::AppState;
use crate::store::ProductRepository;
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::{AppError, AppResult};

/// GET /api/products
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.store.clone());
    Ok(Json(repo.find_all().await?))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.store.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    if data.price < Decimal::ZERO {
        return Err(AppError::validation("price must be non-negative"));
    }
    if data.stock_available < 0 {
        return Err(AppError::validation("stockAvailable must be non-negative"));
    }

    let repo = ProductRepository::new(state.store.clone());
    let product = repo.create(data).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if data.price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("price must be non-negative"));
    }
    if data.stock_available.is_some_and(|s| s < 0) {
        return Err(AppError::validation("stockAvailable must be non-negative"));
    }

    let repo = ProductRepository::new(state.store.clone());
    Ok(Json(repo.update(&id, data).await?))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let repo = ProductRepository::new(state.store.clone());
    repo.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
