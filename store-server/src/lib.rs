//! Storefront Store Server
//!
//! Order intake, queue-driven fulfillment, and record management for the
//! retail storefront.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/    # configuration, shared state, HTTP server
//! ├── api/     # HTTP routes and handlers
//! ├── store/   # record store (keyed persistence capability)
//! ├── queue/   # queue transport and delivery pump
//! ├── orders/  # intake service, fulfillment worker, status service
//! └── common/  # logging
//! ```

pub mod api;
pub mod common;
pub mod core;
pub mod orders;
pub mod queue;
pub mod store;

// Re-export public types
pub use self::core::{AppState, Config, Server};
pub use shared::{AppError, AppResult};
