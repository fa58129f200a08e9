//! Queue transport
//!
//! Named channels carrying text messages. The send side is the
//! [`MessageQueue`] capability; delivery runs through [`QueueConsumer`],
//! which owns the retry/dead-letter policy. One consumer per channel, so
//! single-delivery-in-flight holds per message; delivery overall is
//! at-least-once.

pub mod consumer;
pub mod memory;

pub use consumer::{HandleError, MessageHandler, QueueConsumer};
pub use memory::{DeadLetter, MemoryQueue};

use async_trait::async_trait;
use shared::AppError;
use thiserror::Error;

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("Channel already has a consumer: {0}")]
    AlreadySubscribed(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        AppError::queue(err.to_string())
    }
}

/// Send-side capability: deliver a text message to a named channel.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, channel: &str, body: String) -> QueueResult<()>;
}
