use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::{BusMessage, EventBus, EventBusError, MessageStream, Result};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Default)]
struct Topics {
    channels: HashMap<String, broadcast::Sender<Vec<u8>>>,
    published: HashMap<String, VecDeque<Vec<u8>>>,
}

/// In-memory bus that fans each published message out to every live
/// subscriber of the topic.
///
/// Like a fire-and-forget broker, messages published while nobody is
/// subscribed are not retained for later subscribers. For inspection the
/// bus keeps the most recent `capacity` payloads of each topic, so memory
/// stays bounded in a long-running process.
#[derive(Clone)]
pub struct InMemoryEventBus {
    topics: Arc<RwLock<Topics>>,
    capacity: usize,
    fail_publishes: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Creates a bus with the default per-topic buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus whose subscribers may lag by at most `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(Topics::default())),
            capacity,
            fail_publishes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every subsequent publish fail, simulating an unreachable broker.
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Returns the most recent payloads accepted on `topic`, oldest first,
    /// at most `capacity` of them.
    pub async fn published(&self, topic: &str) -> Vec<Vec<u8>> {
        self.topics
            .read()
            .await
            .published
            .get(topic)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .channels
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        let mut topics = self.topics.write().await;
        topics
            .channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, _key: &str, payload: Vec<u8>) -> Result<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(EventBusError::Publish {
                topic: topic.to_string(),
                reason: "bus unavailable".to_string(),
            });
        }

        let tx = self.sender(topic).await;
        {
            let mut topics = self.topics.write().await;
            let log = topics.published.entry(topic.to_string()).or_default();
            if log.len() == self.capacity {
                log.pop_front();
            }
            log.push_back(payload.clone());
        }

        // No receivers is not an error: the message is simply not delivered.
        let delivered = tx.send(payload).unwrap_or(0);
        tracing::trace!(topic, delivered, "message published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let rx = self.sender(topic).await.subscribe();
        let topic = topic.to_string();

        let stream = futures_util::stream::unfold((rx, topic), |(mut rx, topic)| async move {
            match rx.recv().await {
                Ok(payload) => {
                    let message = BusMessage {
                        topic: topic.clone(),
                        payload,
                    };
                    Some((Ok(message), (rx, topic)))
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    let err = EventBusError::Transport(format!(
                        "subscriber lagged, {skipped} messages skipped"
                    ));
                    Some((Err(err), (rx, topic)))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        });

        Ok(Box::pin(stream))
    }
}
