use async_trait::async_trait;
use common::UserId;

use crate::{Result, UserNotification};

/// What a single upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed for the user; one was created.
    Inserted,
    /// The existing record was overwritten in place.
    Updated,
    /// The stored record reflects a newer source mutation; nothing changed.
    Stale,
}

/// Storage for the notification read model.
///
/// Implementations must make [`upsert`](ProjectionStore::upsert) a single
/// atomic operation: match by `user_id`, overwrite every field or create the
/// record, and skip the write if the stored `source_updated_at` is newer
/// than the incoming one. Equal timestamps overwrite, which keeps
/// redelivery idempotent.
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    /// Atomically inserts or overwrites the record for `record.user_id`.
    async fn upsert(&self, record: UserNotification) -> Result<UpsertOutcome>;

    /// Point lookup by user id.
    ///
    /// Returns None if no event for the user has been applied.
    async fn get(&self, user_id: UserId) -> Result<Option<UserNotification>>;

    /// Returns every record.
    async fn list(&self) -> Result<Vec<UserNotification>>;

    /// Returns the number of records.
    async fn count(&self) -> Result<usize>;
}
