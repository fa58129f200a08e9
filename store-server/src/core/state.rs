//! Application state

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::orders::{FulfillmentWorker, OrderIntakeService, StatusService};
use crate::queue::{MemoryQueue, QueueConsumer};
use crate::store::{MemoryStore, TableStore};
use shared::message;

/// Shared application state
///
/// Holds the storage and queue capabilities behind `Arc`s; cloning is
/// cheap, and every handler and service works off the same instances.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Config,
    /// Record store capability
    pub store: Arc<dyn TableStore>,
    /// Queue transport
    pub queue: Arc<MemoryQueue>,
    /// Shutdown signal for background tasks
    cancel: CancellationToken,
}

impl AppState {
    /// Assemble the application state from configuration
    pub fn initialize(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: Arc::new(MemoryStore::new()),
            queue: Arc::new(MemoryQueue::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Start background tasks.
    ///
    /// Spawns the fulfillment worker's queue consumer; it owns the
    /// order-processing channel for the lifetime of the process.
    pub fn start_background_tasks(&self) {
        let worker = FulfillmentWorker::new(self.store.clone());
        let consumer = QueueConsumer::new(self.queue.clone(), message::ORDER_PROCESSING, worker);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            consumer.run(cancel).await;
        });
    }

    /// Order intake service bound to this state
    pub fn intake(&self) -> OrderIntakeService {
        OrderIntakeService::new(self.store.clone(), self.queue.clone())
    }

    /// Status service bound to this state
    pub fn status(&self) -> StatusService {
        StatusService::new(self.store.clone(), self.queue.clone())
    }

    /// Signal background tasks to stop
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
