use thiserror::Error;

use crate::UserId;

/// Errors that can occur when interacting with the user store.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// No user row matches the id.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for user store operations.
pub type Result<T> = std::result::Result<T, UserStoreError>;
