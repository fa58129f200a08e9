//! Queue channel contracts
//!
//! Payload types and channel names for the three queue channels the
//! storefront uses. Channels carry JSON text; every payload here is the
//! authoritative wire schema for its channel.

mod payload;

pub use payload::{OrderMessage, StatusNotification, StockUpdate};

/// Channel carrying order messages from intake to the fulfillment worker
pub const ORDER_PROCESSING: &str = "order-processing";

/// Channel broadcasting order status transitions (fire-and-forget)
pub const ORDER_NOTIFICATIONS: &str = "order-notifications";

/// Channel broadcasting inventory changes (fire-and-forget)
pub const STOCK_UPDATES: &str = "stock-updates";
