use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus};

// ==================== Order Message ====================

/// Queue payload snapshotting everything needed to materialize an Order
/// record without re-querying customer or product state.
///
/// Invariant: `total_price == unit_price * quantity`, computed once at
/// intake and never recomputed downstream. `order_id` doubles as the queue
/// correlation key and the eventual store row key, which is what makes
/// redelivery idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    /// Serialized as a plain JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    /// Submission time captured at intake, always UTC
    pub submitted_at: DateTime<Utc>,
}

impl OrderMessage {
    /// Materialize the authoritative Order record carried by this message.
    ///
    /// Newly materialized orders always enter `Processing`; the order date
    /// is the submission time captured at intake, not the processing time.
    pub fn into_order(self) -> Order {
        Order {
            id: self.order_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            status: OrderStatus::Processing,
            order_date: self.submitted_at,
        }
    }
}

// ==================== Status Notification ====================

/// Broadcast payload for an order status transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub product_name: String,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub updated_date: DateTime<Utc>,
    pub updated_by: String,
}

impl StatusNotification {
    /// Build a notification for a transition just applied to `order`
    pub fn for_transition(order: &Order, previous: OrderStatus, updated_by: impl Into<String>) -> Self {
        Self {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            customer_name: order.customer_name.clone(),
            product_name: order.product_name.clone(),
            previous_status: previous,
            new_status: order.status,
            updated_date: Utc::now(),
            updated_by: updated_by.into(),
        }
    }
}

// ==================== Stock Update ====================

/// Broadcast payload for an inventory change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub product_id: String,
    pub product_name: String,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub updated_by: String,
    pub update_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> OrderMessage {
        OrderMessage {
            order_id: "o-1".to_string(),
            customer_id: "c-1".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            product_id: "p-1".to_string(),
            product_name: "Widget".to_string(),
            quantity: 3,
            unit_price: Decimal::new(1000, 2),
            total_price: Decimal::new(3000, 2),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_into_order_enters_processing() {
        let message = sample_message();
        let submitted_at = message.submitted_at;

        let order = message.into_order();
        assert_eq!(order.id, "o-1");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.order_date, submitted_at);
        assert_eq!(order.total_price, Decimal::new(3000, 2));
    }

    #[test]
    fn test_order_message_wire_fields() {
        let json = serde_json::to_value(sample_message()).unwrap();
        for field in [
            "orderId",
            "customerId",
            "customerName",
            "productId",
            "productName",
            "quantity",
            "unitPrice",
            "totalPrice",
            "submittedAt",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        // Prices cross the wire as plain JSON numbers
        assert!(json["unitPrice"].is_number());
        assert_eq!(json["quantity"], 3);
    }
}
