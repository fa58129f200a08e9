//! Product Repository

use std::sync::Arc;

use uuid::Uuid;

use super::{BaseRepository, Versioned};
use crate::store::{StoreResult, TableStore, Version};
use shared::models::{Product, ProductCreate, ProductUpdate};

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Product>> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.base.get::<Product>(id).await?.map(|v| v.record))
    }

    /// Point lookup returning the concurrency token alongside the product.
    /// The intake pipeline uses this for its stock compare-and-swap.
    pub async fn find_versioned(&self, id: &str) -> StoreResult<Option<Versioned<Product>>> {
        self.base.get(id).await
    }

    /// Conditional write guarded by the token from [`find_versioned`].
    ///
    /// [`find_versioned`]: Self::find_versioned
    pub async fn update_versioned(
        &self,
        product: &Product,
        version: Version,
    ) -> StoreResult<Version> {
        self.base.update(product, version).await
    }

    /// Create a new product with a generated id
    pub async fn create(&self, data: ProductCreate) -> StoreResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            product_name: data.product_name,
            description: data.description,
            price: data.price,
            stock_available: data.stock_available,
            image_url: data.image_url.unwrap_or_default(),
        };
        self.base.insert(&product).await?;
        Ok(product)
    }

    /// Apply a partial update under the row's concurrency token
    pub async fn update(&self, id: &str, data: ProductUpdate) -> StoreResult<Product> {
        let Versioned { mut record, version } = self.base.require::<Product>(id).await?;

        if let Some(v) = data.product_name {
            record.product_name = v;
        }
        if let Some(v) = data.description {
            record.description = v;
        }
        if let Some(v) = data.price {
            record.price = v;
        }
        if let Some(v) = data.stock_available {
            record.stock_available = v;
        }
        if let Some(v) = data.image_url {
            record.image_url = v;
        }

        self.base.update(&record, version).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.base.delete::<Product>(id).await
    }
}
