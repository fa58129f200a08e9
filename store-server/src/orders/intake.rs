//! Order Intake Service
//!
//! Accepts an order synchronously: validates it against current customer
//! and product state, prices it, reserves stock under optimistic
//! concurrency, and hands the order to the fulfillment worker through the
//! queue. The caller gets the generated order id back before the order row
//! exists; stock reservation is the only strongly consistent step.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::queue::MessageQueue;
use crate::store::{CustomerRepository, ProductRepository, StoreError, TableStore, Versioned};
use shared::message::{self, OrderMessage, StockUpdate};
use shared::models::{OrderAccepted, OrderSubmit, Product};
use shared::{AppError, AppResult};

/// Bound on optimistic-concurrency retries for the stock compare-and-swap
const MAX_STOCK_RETRIES: u32 = 3;

/// Actor recorded on stock-update notifications published by intake
const STOCK_UPDATED_BY: &str = "Order System";

pub struct OrderIntakeService {
    customers: CustomerRepository,
    products: ProductRepository,
    queue: Arc<dyn MessageQueue>,
}

impl OrderIntakeService {
    pub fn new(store: Arc<dyn TableStore>, queue: Arc<dyn MessageQueue>) -> Self {
        Self {
            customers: CustomerRepository::new(store.clone()),
            products: ProductRepository::new(store),
            queue,
        }
    }

    /// Submit an order for processing.
    ///
    /// On success the stock decrement has committed and exactly one order
    /// message is on the fulfillment channel; the returned order id is the
    /// row key the authoritative order will be stored under. Stock is
    /// decremented before the message is enqueued, so channel consumers
    /// always observe stock that already reflects the order.
    pub async fn submit(&self, request: OrderSubmit) -> AppResult<OrderAccepted> {
        // 1. Resolve customer
        let customer = self
            .customers
            .find_by_id(&request.customer_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Customer {}", request.customer_id)))?;

        // 2. Resolve product
        let product = self
            .products
            .find_by_id(&request.product_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Product {}", request.product_id)))?;

        // 3. Quantity must be positive
        if request.quantity < 1 {
            return Err(AppError::validation("quantity must be at least 1"));
        }

        // 4. Stock must cover the order
        if product.stock_available < request.quantity {
            return Err(AppError::insufficient_stock(product.stock_available));
        }

        // Reserve stock before the message becomes visible to consumers.
        // `reserved` is the product state the successful compare-and-swap
        // validated, so pricing below cannot race an admin edit.
        let reserved = self
            .decrement_stock(&request.product_id, request.quantity)
            .await?;

        // Price once at intake; nothing downstream recomputes these.
        let order_id = Uuid::new_v4().to_string();
        let unit_price = reserved.price;
        let total_price = unit_price * Decimal::from(request.quantity);

        let order_message = OrderMessage {
            order_id: order_id.clone(),
            customer_id: customer.id.clone(),
            customer_name: customer.display_name(),
            product_id: reserved.id.clone(),
            product_name: reserved.product_name.clone(),
            quantity: request.quantity,
            unit_price,
            total_price,
            submitted_at: Utc::now(),
        };

        let body = match serde_json::to_string(&order_message) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Failed to encode order message, restoring stock"
                );
                self.restore_stock(&request.product_id, request.quantity)
                    .await;
                return Err(AppError::internal(e.to_string()));
            }
        };
        if let Err(e) = self.queue.send(message::ORDER_PROCESSING, body).await {
            tracing::error!(
                order_id = %order_id,
                product_id = %request.product_id,
                error = %e,
                "Enqueue failed after stock decrement, restoring stock"
            );
            self.restore_stock(&request.product_id, request.quantity)
                .await;
            return Err(AppError::queue("order could not be submitted"));
        }

        self.publish_stock_update(&reserved, request.quantity).await;

        tracing::info!(
            order_id = %order_id,
            customer_id = %request.customer_id,
            product_id = %request.product_id,
            quantity = request.quantity,
            "Order submitted for processing"
        );

        Ok(OrderAccepted {
            message: "Order submitted for processing".to_string(),
            order_id,
        })
    }

    /// Decrement stock under optimistic concurrency.
    ///
    /// Re-fetches and re-checks sufficiency after every conflict; a
    /// concurrent submission that consumed the remaining stock turns into
    /// `InsufficientStock`, never a silent oversell. Returns the product
    /// state (before the decrement) that the winning write validated.
    async fn decrement_stock(&self, product_id: &str, quantity: i32) -> AppResult<Product> {
        for attempt in 0..MAX_STOCK_RETRIES {
            let Some(Versioned {
                record: snapshot,
                version,
            }) = self
                .products
                .find_versioned(product_id)
                .await
                .map_err(AppError::from)?
            else {
                return Err(AppError::not_found(format!("Product {}", product_id)));
            };

            if snapshot.stock_available < quantity {
                return Err(AppError::insufficient_stock(snapshot.stock_available));
            }

            let mut decremented = snapshot.clone();
            decremented.stock_available -= quantity;

            match self.products.update_versioned(&decremented, version).await {
                Ok(_) => return Ok(snapshot),
                Err(StoreError::VersionConflict(_)) => {
                    tracing::debug!(
                        product_id,
                        attempt,
                        "Concurrent stock change, retrying decrement"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::concurrency_conflict(format!(
            "Product {}",
            product_id
        )))
    }

    /// Compensate a committed decrement after the enqueue failed, so stock
    /// is never left reserved with no order in flight. Exhausting the retry
    /// bound leaves a reconciliation record in the log.
    async fn restore_stock(&self, product_id: &str, quantity: i32) {
        for _attempt in 0..MAX_STOCK_RETRIES {
            let fetched = match self.products.find_versioned(product_id).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::error!(product_id, error = %e, "Stock restore read failed");
                    break;
                }
            };
            let Some(Versioned {
                record: mut product,
                version,
            }) = fetched
            else {
                tracing::error!(product_id, "Stock restore skipped, product no longer exists");
                return;
            };

            product.stock_available += quantity;
            match self.products.update_versioned(&product, version).await {
                Ok(_) => {
                    tracing::info!(product_id, quantity, "Stock restored after failed enqueue");
                    return;
                }
                Err(StoreError::VersionConflict(_)) => continue,
                Err(e) => {
                    tracing::error!(product_id, error = %e, "Stock restore write failed");
                    break;
                }
            }
        }

        tracing::error!(
            product_id,
            quantity,
            "Failed to restore stock after enqueue failure, manual reconciliation required"
        );
    }

    /// Fire-and-forget inventory notification.
    ///
    /// `reserved` is the pre-decrement product state, so previous and new
    /// stock derive from the same snapshot the decrement validated.
    async fn publish_stock_update(&self, reserved: &Product, quantity: i32) {
        let update = StockUpdate {
            product_id: reserved.id.clone(),
            product_name: reserved.product_name.clone(),
            previous_stock: reserved.stock_available,
            new_stock: reserved.stock_available - quantity,
            updated_by: STOCK_UPDATED_BY.to_string(),
            update_date: Utc::now(),
        };
        let body = match serde_json::to_string(&update) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode stock update");
                return;
            }
        };
        if let Err(e) = self.queue.send(message::STOCK_UPDATES, body).await {
            tracing::warn!(
                product_id = %update.product_id,
                error = %e,
                "Failed to publish stock update"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{MemoryQueue, QueueError, QueueResult};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use shared::ErrorCode;
    use shared::models::{Customer, Product};

    async fn seed(store: &Arc<MemoryStore>) {
        let customer = Customer {
            id: "c1".to_string(),
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            shipping_address: "1 Analytical Way".to_string(),
        };
        let product = Product {
            id: "p1".to_string(),
            product_name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: Decimal::new(1000, 2),
            stock_available: 5,
            image_url: String::new(),
        };

        let base = crate::store::BaseRepository::new(store.clone() as Arc<dyn TableStore>);
        base.insert(&customer).await.unwrap();
        base.insert(&product).await.unwrap();
    }

    fn submit_request(quantity: i32) -> OrderSubmit {
        OrderSubmit {
            customer_id: "c1".to_string(),
            product_id: "p1".to_string(),
            quantity,
        }
    }

    async fn stock_of(store: &Arc<MemoryStore>, id: &str) -> i32 {
        let products = ProductRepository::new(store.clone() as Arc<dyn TableStore>);
        products
            .find_by_id(id)
            .await
            .unwrap()
            .map(|p| p.stock_available)
            .unwrap_or(-1)
    }

    #[tokio::test]
    async fn test_submit_decrements_stock_and_enqueues_once() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        let accepted = intake.submit(submit_request(3)).await.unwrap();
        assert!(!accepted.order_id.is_empty());

        assert_eq!(stock_of(&store, "p1").await, 2);

        let mut rx = queue.subscribe(message::ORDER_PROCESSING).unwrap();
        let body = rx.recv().await.unwrap();
        let order_message: OrderMessage = serde_json::from_str(&body).unwrap();
        assert_eq!(order_message.order_id, accepted.order_id);
        assert_eq!(order_message.quantity, 3);
        assert_eq!(order_message.unit_price, Decimal::new(1000, 2));
        assert_eq!(order_message.total_price, Decimal::new(3000, 2));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_publishes_stock_update() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        intake.submit(submit_request(2)).await.unwrap();

        let mut rx = queue.subscribe(message::STOCK_UPDATES).unwrap();
        let update: StockUpdate = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(update.product_id, "p1");
        assert_eq!(update.previous_stock, 5);
        assert_eq!(update.new_stock, 3);
        assert_eq!(update.updated_by, "Order System");
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_untouched() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        let err = intake.submit(submit_request(10)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.details.unwrap().get("available").unwrap(), 5);
        assert_eq!(stock_of(&store, "p1").await, 5);

        let mut rx = queue.subscribe(message::ORDER_PROCESSING).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected_first() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        let err = intake
            .submit(OrderSubmit {
                customer_id: "ghost".to_string(),
                product_id: "also-missing".to_string(),
                quantity: 1,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Customer ghost"));
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        let err = intake
            .submit(OrderSubmit {
                customer_id: "c1".to_string(),
                product_id: "ghost".to_string(),
                quantity: 1,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Product ghost"));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        let intake =
            OrderIntakeService::new(store.clone() as Arc<dyn TableStore>, queue.clone());
        for quantity in [0, -3] {
            let err = intake.submit(submit_request(quantity)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }
        assert_eq!(stock_of(&store, "p1").await, 5);
    }

    /// Queue that always refuses, to exercise the compensation path
    struct RefusingQueue;

    #[async_trait]
    impl MessageQueue for RefusingQueue {
        async fn send(&self, channel: &str, _body: String) -> QueueResult<()> {
            Err(QueueError::Closed(channel.to_string()))
        }
    }

    #[tokio::test]
    async fn test_enqueue_failure_restores_stock() {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;

        let intake = OrderIntakeService::new(
            store.clone() as Arc<dyn TableStore>,
            Arc::new(RefusingQueue),
        );
        let err = intake.submit(submit_request(3)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::QueueError);
        assert_eq!(stock_of(&store, "p1").await, 5);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_never_oversell() {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryQueue::new());
        seed(&store).await;

        // Both orders want the full remaining stock
        let intake = Arc::new(OrderIntakeService::new(
            store.clone() as Arc<dyn TableStore>,
            queue.clone(),
        ));
        let a = {
            let intake = intake.clone();
            tokio::spawn(async move { intake.submit(submit_request(5)).await })
        };
        let b = {
            let intake = intake.clone();
            tokio::spawn(async move { intake.submit(submit_request(5)).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(
            a.is_ok() as u32 + b.is_ok() as u32,
            1,
            "exactly one submission may win"
        );
        assert_eq!(stock_of(&store, "p1").await, 0);

        let mut rx = queue.subscribe(message::ORDER_PROCESSING).unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "exactly one message enqueued");
    }
}
