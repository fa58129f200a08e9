//! Record Store
//!
//! Keyed persistence capability over named collections. The raw layer
//! ([`TableStore`]) moves JSON rows with opaque concurrency tokens; the
//! typed layer lives in [`repository`]. The shipped implementation is the
//! in-process [`MemoryStore`]; a cloud table backend plugs in behind the
//! same trait.

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;
pub use repository::{
    BaseRepository, CustomerRepository, OrderRepository, ProductRepository, Record, Versioned,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Opaque optimistic-concurrency token.
///
/// Returned by reads and required by conditional writes. Callers pass the
/// token from the read that produced a row into the write that replaces it;
/// the token's contents are not part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(u64);

impl Version {
    pub(crate) const FIRST: Version = Version(1);

    pub(crate) fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => {
                AppError::with_message(ErrorCode::NotFound, format!("{} not found", what))
            }
            StoreError::AlreadyExists(what) => {
                AppError::with_message(ErrorCode::AlreadyExists, format!("{} already exists", what))
            }
            StoreError::VersionConflict(what) => AppError::concurrency_conflict(what),
            StoreError::Serialization(e) => AppError::storage(e.to_string()),
        }
    }
}

/// A raw stored row together with its concurrency token
#[derive(Debug, Clone)]
pub struct VersionedRow {
    pub value: Value,
    pub version: Version,
}

/// Keyed persistence over named collections.
///
/// Object-safe capability trait: rows are raw JSON values keyed by
/// `(collection, key)`. `update` must reject the write when the stored
/// version differs from `expected`; the compare and the swap are atomic, so
/// two writers racing on the same row serialize exactly here.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Point lookup
    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<VersionedRow>>;

    /// Full-collection scan
    async fn query_all(&self, collection: &str) -> StoreResult<Vec<VersionedRow>>;

    /// Insert a new row; fails if the key already exists
    async fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<Version>;

    /// Insert or overwrite unconditionally
    async fn upsert(&self, collection: &str, key: &str, value: Value) -> StoreResult<Version>;

    /// Conditional overwrite guarded by the version from a prior read
    async fn update(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        expected: Version,
    ) -> StoreResult<Version>;

    /// Remove a row; fails if the key does not exist
    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()>;
}
