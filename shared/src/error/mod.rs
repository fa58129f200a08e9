//! Error types and API response structures

mod codes;
mod types;

pub use codes::{ErrorCategory, ErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
