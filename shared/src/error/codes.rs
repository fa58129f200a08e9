//! Unified error codes for the storefront services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Product/inventory errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not permitted by the order state machine
    InvalidStatusTransition = 4002,

    // ==================== 6xxx: Product ====================
    /// Requested quantity exceeds available stock
    InsufficientStock = 6001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Record store failure
    StorageError = 9002,
    /// Queue transport failure
    QueueError = 9003,
    /// Optimistic-concurrency retries exhausted
    ConcurrencyConflict = 9004,
}

/// Error category, derived from the code band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Order,
    Product,
    System,
}

impl ErrorCode {
    /// Numeric code carried on the wire
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Category band this code belongs to
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            0..=999 => ErrorCategory::General,
            4000..=4999 => ErrorCategory::Order,
            6000..=6999 => ErrorCategory::Product,
            _ => ErrorCategory::System,
        }
    }

    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::OrderNotFound => "Order not found",
            Self::InvalidStatusTransition => "Status transition not permitted",
            Self::InsufficientStock => "Insufficient stock",
            Self::InternalError => "Internal server error",
            Self::StorageError => "Storage error",
            Self::QueueError => "Service temporarily unavailable",
            Self::ConcurrencyConflict => "Conflicting update, please retry",
        }
    }

    /// HTTP status this code maps to
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::Unknown | Self::InternalError | Self::StorageError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::InsufficientStock => StatusCode::CONFLICT,
            Self::InvalidStatusTransition => StatusCode::UNPROCESSABLE_ENTITY,
            Self::QueueError | Self::ConcurrencyConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::InvalidStatusTransition),
            6001 => Ok(Self::InsufficientStock),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::StorageError),
            9003 => Ok(Self::QueueError),
            9004 => Ok(Self::ConcurrencyConflict),
            _ => Err(format!("unknown error code: {value}")),
        }
    }
}
