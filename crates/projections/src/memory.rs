//! In-memory notification store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use tokio::sync::RwLock;

use crate::store::{ProjectionStore, UpsertOutcome};
use crate::{Result, UserNotification};

/// In-memory projection store for tests and single-process setups.
///
/// The write lock is held for the whole compare-and-replace, which makes
/// each upsert atomic.
#[derive(Clone, Default)]
pub struct InMemoryProjectionStore {
    records: Arc<RwLock<HashMap<UserId, UserNotification>>>,
}

impl InMemoryProjectionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectionStore for InMemoryProjectionStore {
    async fn upsert(&self, record: UserNotification) -> Result<UpsertOutcome> {
        let mut records = self.records.write().await;

        let outcome = match records.get(&record.user_id) {
            Some(existing) if existing.source_updated_at > record.source_updated_at => {
                return Ok(UpsertOutcome::Stale);
            }
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        records.insert(record.user_id, record);
        Ok(outcome)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserNotification>> {
        Ok(self.records.read().await.get(&user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserNotification>> {
        let mut all: Vec<_> = self.records.read().await.values().cloned().collect();
        all.sort_by_key(|r| r.user_id);
        Ok(all)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn record(id: i64, name: &str, source: i64) -> UserNotification {
        UserNotification {
            user_id: UserId::new(id),
            name: name.to_string(),
            email: format!("{name}@x.com"),
            updated_at: Utc::now(),
            source_updated_at: at(source),
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_in_place() {
        let store = InMemoryProjectionStore::new();

        assert_eq!(
            store.upsert(record(7, "Alice", 1)).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(record(7, "Alice2", 2)).await.unwrap(),
            UpsertOutcome::Updated
        );

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(
            store.get(UserId::new(7)).await.unwrap().unwrap().name,
            "Alice2"
        );
    }

    #[tokio::test]
    async fn older_source_version_is_stale() {
        let store = InMemoryProjectionStore::new();
        store.upsert(record(7, "New", 5)).await.unwrap();

        assert_eq!(
            store.upsert(record(7, "Old", 4)).await.unwrap(),
            UpsertOutcome::Stale
        );
        assert_eq!(store.get(UserId::new(7)).await.unwrap().unwrap().name, "New");
    }

    #[tokio::test]
    async fn equal_source_version_reapplies() {
        let store = InMemoryProjectionStore::new();
        store.upsert(record(7, "Same", 5)).await.unwrap();

        assert_eq!(
            store.upsert(record(7, "Same", 5)).await.unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_for_one_user_leave_one_record() {
        let store = InMemoryProjectionStore::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert(record(1, "U", i)).await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.source_updated_at, at(31));
    }

    #[tokio::test]
    async fn list_returns_every_record() {
        let store = InMemoryProjectionStore::new();
        store.upsert(record(2, "b", 1)).await.unwrap();
        store.upsert(record(1, "a", 1)).await.unwrap();

        let ids: Vec<i64> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.user_id.as_i64())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
