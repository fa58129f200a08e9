//! Order Fulfillment Worker
//!
//! Consumes order messages and writes the authoritative Order rows. The
//! queue delivers at-least-once with no cross-order ordering; idempotence
//! comes from upserting on the order id carried by the message.

use std::sync::Arc;

use async_trait::async_trait;

use crate::queue::{HandleError, MessageHandler};
use crate::store::{OrderRepository, TableStore};
use shared::AppError;
use shared::message::OrderMessage;

pub struct FulfillmentWorker {
    orders: OrderRepository,
}

impl FulfillmentWorker {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            orders: OrderRepository::new(store),
        }
    }
}

#[async_trait]
impl MessageHandler for FulfillmentWorker {
    /// Materialize one order message into its Order row.
    ///
    /// Redelivery of the same message overwrites identical data. A payload
    /// that does not decode is fatal for that message; a persistence
    /// failure propagates so the transport can retry and eventually
    /// dead-letter.
    async fn handle(&self, body: &str) -> Result<(), HandleError> {
        let order_message: OrderMessage = serde_json::from_str(body).map_err(|e| {
            tracing::error!(error = %e, body, "Discarding undecodable order message");
            HandleError::Fatal(format!("undecodable order message: {}", e))
        })?;

        let order_id = order_message.order_id.clone();
        let order = order_message.into_order();

        self.orders.upsert(&order).await.map_err(|e| {
            tracing::error!(order_id = %order_id, error = %e, "Failed to persist order");
            HandleError::Transient(AppError::from(e))
        })?;

        tracing::info!(order_id = %order_id, status = %order.status, "Order persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::OrderStatus;

    fn sample_body(order_id: &str) -> String {
        let message = OrderMessage {
            order_id: order_id.to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            product_id: "p1".to_string(),
            product_name: "Widget".to_string(),
            quantity: 3,
            unit_price: Decimal::new(1000, 2),
            total_price: Decimal::new(3000, 2),
            submitted_at: Utc::now(),
        };
        serde_json::to_string(&message).unwrap()
    }

    #[tokio::test]
    async fn test_message_materializes_processing_order() {
        let store = Arc::new(MemoryStore::new());
        let worker = FulfillmentWorker::new(store.clone() as Arc<dyn TableStore>);

        worker.handle(&sample_body("o1")).await.unwrap();

        let orders = OrderRepository::new(store as Arc<dyn TableStore>);
        let order = orders.find_by_id("o1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.customer_name, "Ada Lovelace");
        assert_eq!(order.total_price, Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let worker = FulfillmentWorker::new(store.clone() as Arc<dyn TableStore>);
        let body = sample_body("o1");

        worker.handle(&body).await.unwrap();
        let orders = OrderRepository::new(store.clone() as Arc<dyn TableStore>);
        let first = orders.find_by_id("o1").await.unwrap().unwrap();

        // Same message again: no duplicate, no conflict, identical fields
        worker.handle(&body).await.unwrap();
        let all = orders.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], first);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let worker = FulfillmentWorker::new(store.clone() as Arc<dyn TableStore>);

        let err = worker.handle("{\"not\": \"an order\"}").await.unwrap_err();
        assert!(matches!(err, HandleError::Fatal(_)));

        let orders = OrderRepository::new(store as Arc<dyn TableStore>);
        assert!(orders.find_all().await.unwrap().is_empty());
    }
}
