//! Queue delivery pump
//!
//! Drives a channel's single consumer: bounded retry with exponential
//! backoff for transient handler failures, immediate dead-letter for
//! messages that can never succeed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::memory::{DeadLetter, MemoryQueue};
use shared::AppError;

/// Delivery policy
const MAX_DELIVERY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 100;
const RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Handler failure classes.
///
/// The transport retries `Transient` failures with backoff and dead-letters
/// `Fatal` ones without retry; retrying a structurally invalid message
/// cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("{0}")]
    Fatal(String),

    #[error(transparent)]
    Transient(#[from] AppError),
}

/// A single-message handler, invoked at-least-once per queued message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &str) -> Result<(), HandleError>;
}

/// Consumer pump for one channel
pub struct QueueConsumer<H> {
    queue: Arc<MemoryQueue>,
    channel: &'static str,
    handler: H,
}

impl<H: MessageHandler> QueueConsumer<H> {
    pub fn new(queue: Arc<MemoryQueue>, channel: &'static str, handler: H) -> Self {
        Self {
            queue,
            channel,
            handler,
        }
    }

    /// Run until the channel closes or `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut rx = match self.queue.subscribe(self.channel) {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(channel = self.channel, error = %e, "Failed to subscribe");
                return;
            }
        };

        tracing::info!(channel = self.channel, "Queue consumer started");

        loop {
            tokio::select! {
                body = rx.recv() => {
                    match body {
                        Some(body) => self.deliver(body).await,
                        None => {
                            tracing::info!(channel = self.channel, "Channel closed, stopping consumer");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!(channel = self.channel, "Shutdown requested, stopping consumer");
                    break;
                }
            }
        }
    }

    /// Deliver one message, applying the retry policy
    async fn deliver(&self, body: String) {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.handler.handle(&body).await {
                Ok(()) => return,
                Err(HandleError::Fatal(reason)) => {
                    tracing::error!(
                        channel = self.channel,
                        error = %reason,
                        "Message rejected, dead-lettering without retry"
                    );
                    self.queue.push_dead_letter(
                        self.channel,
                        DeadLetter {
                            body,
                            attempts,
                            last_error: reason,
                            failed_at: Utc::now(),
                        },
                    );
                    return;
                }
                Err(HandleError::Transient(e)) if attempts < MAX_DELIVERY_ATTEMPTS => {
                    // Exponential backoff: base * 2^(attempts-1), capped
                    let delay =
                        (RETRY_BASE_DELAY_MS * 2u64.pow(attempts - 1)).min(RETRY_MAX_DELAY_MS);
                    tracing::warn!(
                        channel = self.channel,
                        attempts,
                        delay_ms = delay,
                        error = %e,
                        "Delivery failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(HandleError::Transient(e)) => {
                    tracing::error!(
                        channel = self.channel,
                        attempts,
                        error = %e,
                        "Delivery attempts exhausted, dead-lettering"
                    );
                    self.queue.push_dead_letter(
                        self.channel,
                        DeadLetter {
                            body,
                            attempts,
                            last_error: e.to_string(),
                            failed_at: Utc::now(),
                        },
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MessageQueue;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Handler scripted to fail a fixed number of times before succeeding
    #[derive(Clone)]
    struct FlakyHandler {
        calls: Arc<AtomicU32>,
        failures: u32,
        fatal: bool,
    }

    impl FlakyHandler {
        fn failing(failures: u32) -> Self {
            Self {
                calls: Arc::new(AtomicU32::new(0)),
                failures,
                fatal: false,
            }
        }

        fn fatal() -> Self {
            Self {
                calls: Arc::new(AtomicU32::new(0)),
                failures: u32::MAX,
                fatal: true,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageHandler for FlakyHandler {
        async fn handle(&self, _body: &str) -> Result<(), HandleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fatal {
                return Err(HandleError::Fatal("undecodable".to_string()));
            }
            if call < self.failures {
                return Err(HandleError::Transient(AppError::storage("flaky")));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retries_then_succeeds() {
        let queue = Arc::new(MemoryQueue::new());
        let handler = FlakyHandler::failing(1);
        let consumer = QueueConsumer::new(queue.clone(), "orders", handler.clone());

        consumer.deliver("{}".to_string()).await;

        assert_eq!(handler.calls(), 2);
        assert!(queue.dead_letters("orders").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_dead_letter() {
        let queue = Arc::new(MemoryQueue::new());
        let handler = FlakyHandler::failing(u32::MAX);
        let consumer = QueueConsumer::new(queue.clone(), "orders", handler.clone());

        consumer.deliver("{}".to_string()).await;

        assert_eq!(handler.calls(), MAX_DELIVERY_ATTEMPTS);
        let letters = queue.dead_letters("orders");
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].attempts, MAX_DELIVERY_ATTEMPTS);
        assert_eq!(letters[0].last_error, "flaky");
    }

    #[tokio::test]
    async fn test_fatal_failure_dead_letters_without_retry() {
        let queue = Arc::new(MemoryQueue::new());
        let handler = FlakyHandler::fatal();
        let consumer = QueueConsumer::new(queue.clone(), "orders", handler.clone());

        consumer.deliver("not json".to_string()).await;

        assert_eq!(handler.calls(), 1);
        let letters = queue.dead_letters("orders");
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].attempts, 1);
        assert_eq!(letters[0].body, "not json");
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let queue = Arc::new(MemoryQueue::new());
        let handler = FlakyHandler::failing(0);
        let consumer = QueueConsumer::new(queue.clone(), "orders", handler.clone());

        queue.send("orders", "{}".to_string()).await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(consumer.run(cancel.clone()));

        // Let the buffered message drain, then cancel
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(handler.calls(), 1);
    }
}
