use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::{Result, UserFields, UserId, UserRecord, UserStoreError, store::UserStore};

#[derive(Default)]
struct Rows {
    users: BTreeMap<UserId, UserRecord>,
    last_id: i64,
}

/// In-memory user store implementation for testing.
///
/// Ids are assigned sequentially starting at 1, like a `BIGSERIAL` column.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryUserStore {
    /// Creates a new empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of users stored.
    pub async fn user_count(&self) -> usize {
        self.rows.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, fields: UserFields) -> Result<UserRecord> {
        let mut rows = self.rows.write().await;
        rows.last_id += 1;

        let record = UserRecord {
            id: UserId::new(rows.last_id),
            name: fields.name,
            email: fields.email,
            updated_at: Utc::now(),
        };
        rows.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update(&self, id: UserId, fields: UserFields) -> Result<UserRecord> {
        let mut rows = self.rows.write().await;
        let record = rows
            .users
            .get_mut(&id)
            .ok_or(UserStoreError::NotFound(id))?;

        record.name = fields.name;
        record.email = fields.email;
        record.updated_at = Utc::now().max(record.updated_at + Duration::microseconds(1));

        Ok(record.clone())
    }

    async fn get(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.rows.read().await.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(self.rows.read().await.users.values().cloned().collect())
    }
}
