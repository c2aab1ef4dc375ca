//! Domain error types.

use common::UserId;
use event_bus::EventBusError;
use thiserror::Error;
use user_events::EventError;
use user_store::UserStoreError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request carried unusable input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No user exists with the id.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// The authoritative store failed.
    #[error("User store error: {0}")]
    Store(UserStoreError),

    /// The event could not be serialized.
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// The bus rejected the event. Only surfaced under
    /// [`PublishPolicy::Required`](crate::PublishPolicy::Required); the
    /// store has already committed when this is returned.
    #[error("Publish error: {0}")]
    Publish(#[from] EventBusError),
}

impl From<UserStoreError> for DomainError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound(id) => DomainError::NotFound(id),
            other => DomainError::Store(other),
        }
    }
}
