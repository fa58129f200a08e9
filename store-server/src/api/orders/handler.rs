//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::core::AppState;
use crate::store::OrderRepository;
use shared::models::{Order, OrderAccepted, OrderStatus, OrderStatusUpdate, OrderSubmit};
use shared::{AppError, AppResult};

/// Actor recorded on operator-triggered status transitions
const STATUS_UPDATED_BY: &str = "System";

/// GET /api/orders
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.store.clone());
    Ok(Json(repo.find_all().await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.store.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::order_not_found(&id))?;
    Ok(Json(order))
}

/// POST /api/orders - accept an order for asynchronous processing.
///
/// Responds 202: the stock reservation has committed, the authoritative
/// order row is written later by the fulfillment worker.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<OrderSubmit>,
) -> AppResult<(StatusCode, Json<OrderAccepted>)> {
    let accepted = state.intake().submit(request).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let Some(new_status) = OrderStatus::parse(&request.status) else {
        return Err(AppError::validation(format!(
            "unknown order status: {}",
            request.status
        )));
    };

    let order = state
        .status()
        .update_status(&id, new_status, STATUS_UPDATED_BY)
        .await?;
    Ok(Json(order))
}
