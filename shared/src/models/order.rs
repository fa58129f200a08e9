//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
///
/// Transitions: `Submitted → Processing → {Completed, Cancelled}`.
/// `Submitted` is the declared default of an order value before any
/// processing has happened; the fulfillment worker writes `Processing`, so
/// `Submitted` is normally never persisted. `Completed` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Submitted,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is permitted out of this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Parse an exact status string; unknown strings yield `None`
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "Submitted" => Some(Self::Submitted),
            "Processing" => Some(Self::Processing),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity (one row per order in the `Order` collection)
///
/// `unit_price` and `total_price` are captured at intake and never
/// recomputed; later product price changes do not affect existing orders.
/// `order_date` is always UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
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
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

/// Submit order request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmit {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
}

/// Accepted-order response
///
/// Returned as soon as intake has reserved stock and enqueued the order
/// message; the authoritative order row may not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAccepted {
    pub message: String,
    pub order_id: String,
}

/// Update status payload; the status string is validated against the
/// state machine's known names before any lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: String,
}
