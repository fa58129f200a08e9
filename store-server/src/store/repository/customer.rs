//! Customer Repository

use std::sync::Arc;

use uuid::Uuid;

use super::{BaseRepository, Versioned};
use crate::store::{StoreResult, TableStore};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

#[derive(Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Customer>> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(self.base.get::<Customer>(id).await?.map(|v| v.record))
    }

    /// Create a new customer with a generated id
    pub async fn create(&self, data: CustomerCreate) -> StoreResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            surname: data.surname,
            username: data.username,
            email: data.email,
            shipping_address: data.shipping_address,
        };
        self.base.insert(&customer).await?;
        Ok(customer)
    }

    /// Apply a partial update under the row's concurrency token
    pub async fn update(&self, id: &str, data: CustomerUpdate) -> StoreResult<Customer> {
        let Versioned { mut record, version } = self.base.require::<Customer>(id).await?;

        if let Some(v) = data.name {
            record.name = v;
        }
        if let Some(v) = data.surname {
            record.surname = v;
        }
        if let Some(v) = data.username {
            record.username = v;
        }
        if let Some(v) = data.email {
            record.email = v;
        }
        if let Some(v) = data.shipping_address {
            record.shipping_address = v;
        }

        self.base.update(&record, version).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.base.delete::<Customer>(id).await
    }
}
