//! In-process queue transport

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::{MessageQueue, QueueError, QueueResult};

/// A message that permanently failed delivery, kept for manual recovery
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub body: String,
    pub attempts: u32,
    pub last_error: String,
    pub failed_at: DateTime<Utc>,
}

struct Channel {
    tx: mpsc::UnboundedSender<String>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl Channel {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }
}

/// In-memory queue
///
/// Channels are created lazily on first send or subscribe; messages sent
/// before a consumer attaches are buffered in order. Each channel hands out
/// its receiving end exactly once.
#[derive(Default)]
pub struct MemoryQueue {
    channels: DashMap<String, Channel>,
    dead_letters: DashMap<String, Vec<DeadLetter>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the receiving end of a channel. Fails if a consumer already
    /// holds it.
    pub fn subscribe(&self, channel: &str) -> QueueResult<mpsc::UnboundedReceiver<String>> {
        let entry = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(Channel::new);
        entry
            .rx
            .lock()
            .expect("channel receiver lock is never poisoned")
            .take()
            .ok_or_else(|| QueueError::AlreadySubscribed(channel.to_string()))
    }

    /// Record a permanently failed message
    pub fn push_dead_letter(&self, channel: &str, letter: DeadLetter) {
        self.dead_letters
            .entry(channel.to_string())
            .or_default()
            .push(letter);
    }

    /// Dead letters accumulated for a channel
    pub fn dead_letters(&self, channel: &str) -> Vec<DeadLetter> {
        self.dead_letters
            .get(channel)
            .map(|letters| letters.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(&self, channel: &str, body: String) -> QueueResult<()> {
        let entry = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(Channel::new);
        entry
            .tx
            .send(body)
            .map_err(|_| QueueError::Closed(channel.to_string()))
    }
}
