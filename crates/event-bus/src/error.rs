use thiserror::Error;

/// Errors that can occur when talking to the message bus.
#[derive(Debug, Clone, Error)]
pub enum EventBusError {
    /// The bus client could not be created or reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The message was not accepted for delivery.
    #[error("Publish failed for topic '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    /// The subscription could not be established.
    #[error("Subscription failed for topic '{topic}': {reason}")]
    Subscribe { topic: String, reason: String },

    /// A message could not be received from an established subscription.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, EventBusError>;
