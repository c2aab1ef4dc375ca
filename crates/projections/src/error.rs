//! Projection error types.

use thiserror::Error;

/// Errors that can occur in the notification read model.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The subscription could not be opened.
    #[error("Event bus error: {0}")]
    Bus(#[from] event_bus::EventBusError),

    /// The configured table name is not a plain SQL identifier.
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
