use thiserror::Error;

/// Errors raised while encoding or decoding a user change event.
#[derive(Debug, Error)]
pub enum EventError {
    /// The message was not valid JSON, had no `type`, or a known type
    /// carried a missing or wrong-typed payload field.
    #[error("Malformed event: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The event could not be serialized.
    #[error("Event encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for event codec operations.
pub type Result<T> = std::result::Result<T, EventError>;
