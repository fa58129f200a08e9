//! In-process table store
//!
//! DashMap-backed implementation of [`TableStore`]. Conditional updates
//! compare-and-swap under the shard lock, so concurrent writers against the
//! same row serialize exactly at the version check; distinct rows never
//! contend.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

use super::{StoreError, StoreResult, TableStore, Version, VersionedRow};

#[derive(Debug, Clone)]
struct StoredRow {
    value: Value,
    version: Version,
}

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<(String, String), StoredRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row_key(collection: &str, key: &str) -> (String, String) {
        (collection.to_string(), key.to_string())
    }

    fn describe(collection: &str, key: &str) -> String {
        format!("{} {}", collection, key)
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<VersionedRow>> {
        Ok(self.rows.get(&Self::row_key(collection, key)).map(|row| VersionedRow {
            value: row.value.clone(),
            version: row.version,
        }))
    }

    async fn query_all(&self, collection: &str) -> StoreResult<Vec<VersionedRow>> {
        let mut rows: Vec<(String, VersionedRow)> = self
            .rows
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| {
                (
                    entry.key().1.clone(),
                    VersionedRow {
                        value: entry.value().value.clone(),
                        version: entry.value().version,
                    },
                )
            })
            .collect();

        // Deterministic scan order: sort by row key
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<Version> {
        match self.rows.entry(Self::row_key(collection, key)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(Self::describe(collection, key))),
            Entry::Vacant(vacant) => {
                vacant.insert(StoredRow {
                    value,
                    version: Version::FIRST,
                });
                Ok(Version::FIRST)
            }
        }
    }

    async fn upsert(&self, collection: &str, key: &str, value: Value) -> StoreResult<Version> {
        match self.rows.entry(Self::row_key(collection, key)) {
            Entry::Occupied(mut occupied) => {
                let next = occupied.get().version.next();
                occupied.insert(StoredRow { value, version: next });
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredRow {
                    value,
                    version: Version::FIRST,
                });
                Ok(Version::FIRST)
            }
        }
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        expected: Version,
    ) -> StoreResult<Version> {
        match self.rows.entry(Self::row_key(collection, key)) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().version != expected {
                    return Err(StoreError::VersionConflict(Self::describe(collection, key)));
                }
                let next = expected.next();
                occupied.insert(StoredRow { value, version: next });
                Ok(next)
            }
            Entry::Vacant(_) => Err(StoreError::NotFound(Self::describe(collection, key))),
        }
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.rows
            .remove(&Self::row_key(collection, key))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(Self::describe(collection, key)))
    }
}
