//! Order Repository
//!
//! Orders have no create/delete path here: the fulfillment worker upserts
//! rows materialized from queue messages, and status transitions go through
//! the conditional write. Order identity is generated by intake, never by
//! the storage layer.

use std::sync::Arc;

use super::{BaseRepository, Versioned};
use crate::store::{StoreResult, TableStore, Version};
use shared::models::Order;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Order>> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.base.get::<Order>(id).await?.map(|v| v.record))
    }

    /// Point lookup returning the concurrency token alongside the order
    pub async fn find_versioned(&self, id: &str) -> StoreResult<Option<Versioned<Order>>> {
        self.base.get(id).await
    }

    /// Idempotent write keyed by the order id; redelivered messages
    /// overwrite identical data instead of duplicating
    pub async fn upsert(&self, order: &Order) -> StoreResult<Version> {
        self.base.upsert(order).await
    }

    /// Conditional write guarded by the token from [`find_versioned`].
    ///
    /// [`find_versioned`]: Self::find_versioned
    pub async fn update_versioned(&self, order: &Order, version: Version) -> StoreResult<Version> {
        self.base.update(order, version).await
    }
}
