//! Order status transitions
//!
//! Applies validated transitions against the order state machine and
//! broadcasts them on the notification channel. The persisted transition is
//! the source of truth; notifications are best-effort.

use std::sync::Arc;

use crate::queue::MessageQueue;
use crate::store::{OrderRepository, StoreError, TableStore, Versioned};
use shared::message::{self, StatusNotification};
use shared::models::{Order, OrderStatus};
use shared::{AppError, AppResult};

/// Bound on optimistic-concurrency retries for the status write
const MAX_UPDATE_RETRIES: u32 = 3;

pub struct StatusService {
    orders: OrderRepository,
    queue: Arc<dyn MessageQueue>,
}

impl StatusService {
    pub fn new(store: Arc<dyn TableStore>, queue: Arc<dyn MessageQueue>) -> Self {
        Self {
            orders: OrderRepository::new(store),
            queue,
        }
    }

    /// Transition an order to `new_status`.
    ///
    /// The transition is re-validated after every conflicting re-fetch, so
    /// a concurrent transition cannot be overwritten and terminal states
    /// stay terminal.
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        updated_by: &str,
    ) -> AppResult<Order> {
        for _attempt in 0..MAX_UPDATE_RETRIES {
            let Some(Versioned {
                record: mut order,
                version,
            }) = self
                .orders
                .find_versioned(order_id)
                .await
                .map_err(AppError::from)?
            else {
                return Err(AppError::order_not_found(order_id));
            };

            let previous = order.status;
            if !previous.can_transition_to(new_status) {
                return Err(AppError::invalid_transition(previous, new_status));
            }

            order.status = new_status;
            match self.orders.update_versioned(&order, version).await {
                Ok(_) => {
                    tracing::info!(
                        order_id = %order.id,
                        previous_status = %previous,
                        new_status = %new_status,
                        "Order status updated"
                    );
                    self.publish_notification(&order, previous, updated_by).await;
                    return Ok(order);
                }
                Err(StoreError::VersionConflict(_)) => {
                    tracing::debug!(order_id, "Concurrent order change, retrying status update");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::concurrency_conflict(format!("Order {}", order_id)))
    }

    /// Fire-and-forget broadcast; a publish failure never rolls back the
    /// persisted transition
    async fn publish_notification(&self, order: &Order, previous: OrderStatus, updated_by: &str) {
        let notification = StatusNotification::for_transition(order, previous, updated_by);
        let body = match serde_json::to_string(&notification) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Failed to encode notification");
                return;
            }
        };
        if let Err(e) = self.queue.send(message::ORDER_NOTIFICATIONS, body).await {
            tracing::warn!(
                order_id = %order.id,
                error = %e,
                "Failed to publish status notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::ErrorCode;

    fn sample_order(status: OrderStatus) -> Order {
        Order {
            id: "o1".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            product_id: "p1".to_string(),
            product_name: "Widget".to_string(),
            quantity: 3,
            unit_price: Decimal::new(1000, 2),
            total_price: Decimal::new(3000, 2),
            status,
            order_date: Utc::now(),
        }
    }

    async fn setup(status: OrderStatus) -> (StatusService, Arc<MemoryQueue>) {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());

        let orders = OrderRepository::new(store.clone() as Arc<dyn TableStore>);
        orders.upsert(&sample_order(status)).await.unwrap();

        (
            StatusService::new(store as Arc<dyn TableStore>, queue.clone()),
            queue,
        )
    }

    #[tokio::test]
    async fn test_transition_persists_and_notifies() {
        let (service, queue) = setup(OrderStatus::Processing).await;

        let order = service
            .update_status("o1", OrderStatus::Completed, "System")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        let mut rx = queue.subscribe(message::ORDER_NOTIFICATIONS).unwrap();
        let notification: StatusNotification =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(notification.order_id, "o1");
        assert_eq!(notification.previous_status, OrderStatus::Processing);
        assert_eq!(notification.new_status, OrderStatus::Completed);
        assert_eq!(notification.updated_by, "System");
    }

    #[tokio::test]
    async fn test_terminal_order_rejects_transition() {
        let (service, queue) = setup(OrderStatus::Completed).await;

        let err = service
            .update_status("o1", OrderStatus::Processing, "System")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

        // No notification for a rejected transition
        let mut rx = queue.subscribe(message::ORDER_NOTIFICATIONS).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submitted_cannot_skip_processing() {
        let (service, _queue) = setup(OrderStatus::Submitted).await;

        let err = service
            .update_status("o1", OrderStatus::Completed, "System")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let (service, _queue) = setup(OrderStatus::Processing).await;

        let err = service
            .update_status("ghost", OrderStatus::Completed, "System")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }
}
