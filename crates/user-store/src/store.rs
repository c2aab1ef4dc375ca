use async_trait::async_trait;

use crate::{Result, UserFields, UserId, UserRecord};

/// Core trait for authoritative user store implementations.
///
/// Every mutation returns the row as persisted, including store-assigned
/// fields. Concurrent writes to the same row are serialized by the store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. The store assigns `id` and `updated_at`.
    async fn create(&self, fields: UserFields) -> Result<UserRecord>;

    /// Overwrites `name` and `email` of an existing user and refreshes
    /// `updated_at`.
    ///
    /// The new `updated_at` is strictly greater than the value the row held
    /// when the update acquired it, so stamps on one row increase in commit
    /// order. Subscribers rely on this to discard older events.
    ///
    /// Fails with [`UserStoreError::NotFound`](crate::UserStoreError::NotFound)
    /// if no row matches `id`.
    async fn update(&self, id: UserId, fields: UserFields) -> Result<UserRecord>;

    /// Retrieves a single user.
    ///
    /// Returns None if the user doesn't exist.
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Retrieves all users ordered by ascending id.
    async fn list(&self) -> Result<Vec<UserRecord>>;
}
