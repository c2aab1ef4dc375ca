use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::Result;

/// A raw message received from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A stream of messages from one subscription.
///
/// Transport hiccups surface as `Err` items; the stream keeps going after them.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<BusMessage>> + Send>>;

/// Core trait for message bus transports.
///
/// Delivery is at-least-once or never: a subscriber may see the same
/// message more than once, and a message published while the transport is
/// unreachable may be lost.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Hands a message to the transport.
    ///
    /// `Ok` means the transport accepted the message for delivery, not that
    /// any subscriber received it. Messages sharing a `key` keep their
    /// publish order.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()>;

    /// Opens a long-lived subscription to `topic`.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}
