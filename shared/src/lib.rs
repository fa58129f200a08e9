//! Shared types for the storefront services
//!
//! Domain models, queue payload contracts, and the unified error/response
//! types used by the store server and any client crates.

pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
