//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::core::AppState;
use crate::store::CustomerRepository;
use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use shared::{AppError, AppResult};

/// GET /api/customers
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let repo = CustomerRepository::new(state.store.clone());
    Ok(Json(repo.find_all().await?))
}

/// GET /api/customers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    let repo = CustomerRepository::new(state.store.clone());
    let customer = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;
    Ok(Json(customer))
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<CustomerCreate>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let repo = CustomerRepository::new(state.store.clone());
    let customer = repo.create(data).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    let repo = CustomerRepository::new(state.store.clone());
    Ok(Json(repo.update(&id, data).await?))
}

/// DELETE /api/customers/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let repo = CustomerRepository::new(state.store.clone());
    repo.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
