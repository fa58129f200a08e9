//! Typed repositories over the raw table store
//!
//! One generic CRUD seam ([`BaseRepository`]) parameterized by record kind,
//! plus a thin typed repository per entity. Repositories return
//! [`StoreResult`]; handlers and services translate to `AppError` at the
//! boundary.

mod customer;
mod order;
mod product;

pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{StoreError, StoreResult, TableStore, Version, VersionedRow};
use shared::models::{Customer, Order, Product};

/// A record kind persisted in the table store.
///
/// `COLLECTION` names the collection the kind lives in; `key` is the row
/// key within it.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn key(&self) -> &str;
}

impl Record for Customer {
    const COLLECTION: &'static str = "Customer";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Record for Product {
    const COLLECTION: &'static str = "Product";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Record for Order {
    const COLLECTION: &'static str = "Order";

    fn key(&self) -> &str {
        &self.id
    }
}

/// A typed record together with the token its read produced
#[derive(Debug, Clone)]
pub struct Versioned<R> {
    pub record: R,
    pub version: Version,
}

/// Generic CRUD layer shared by every typed repository
#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn TableStore>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    fn decode<R: Record>(row: VersionedRow) -> StoreResult<Versioned<R>> {
        Ok(Versioned {
            record: serde_json::from_value(row.value)?,
            version: row.version,
        })
    }

    /// Point lookup
    pub async fn get<R: Record>(&self, key: &str) -> StoreResult<Option<Versioned<R>>> {
        match self.store.get(R::COLLECTION, key).await? {
            Some(row) => Ok(Some(Self::decode(row)?)),
            None => Ok(None),
        }
    }

    /// Point lookup that treats absence as an error
    pub async fn require<R: Record>(&self, key: &str) -> StoreResult<Versioned<R>> {
        self.get(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", R::COLLECTION, key)))
    }

    /// Full-collection scan
    pub async fn find_all<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.store
            .query_all(R::COLLECTION)
            .await?
            .into_iter()
            .map(|row| Ok(serde_json::from_value(row.value)?))
            .collect()
    }

    /// Insert a new record; fails if the key already exists
    pub async fn insert<R: Record>(&self, record: &R) -> StoreResult<Version> {
        self.store
            .insert(R::COLLECTION, record.key(), serde_json::to_value(record)?)
            .await
    }

    /// Insert or overwrite unconditionally
    pub async fn upsert<R: Record>(&self, record: &R) -> StoreResult<Version> {
        self.store
            .upsert(R::COLLECTION, record.key(), serde_json::to_value(record)?)
            .await
    }

    /// Conditional overwrite guarded by the token from a prior read
    pub async fn update<R: Record>(&self, record: &R, expected: Version) -> StoreResult<Version> {
        self.store
            .update(
                R::COLLECTION,
                record.key(),
                serde_json::to_value(record)?,
                expected,
            )
            .await
    }

    /// Remove a record
    pub async fn delete<R: Record>(&self, key: &str) -> StoreResult<()> {
        self.store.delete(R::COLLECTION, key).await
    }
}
