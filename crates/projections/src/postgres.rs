//! PostgreSQL-backed notification store.
//!
//! Runs against its own database, never the user service's. Each record is
//! one row keyed by `user_id`:
//!
//! ```sql
//! CREATE TABLE user_notifications (
//!     user_id BIGINT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     email TEXT NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     source_updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::store::{ProjectionStore, UpsertOutcome};
use crate::{ProjectionError, Result, UserNotification};

/// PostgreSQL projection store.
#[derive(Clone)]
pub struct PostgresProjectionStore {
    pool: PgPool,
    table: String,
}

impl PostgresProjectionStore {
    /// Creates a store over an existing pool.
    ///
    /// `table` plays the role of the collection name and must be a plain
    /// identifier (letters, digits, underscores).
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(ProjectionError::InvalidTable(table));
        }
        Ok(Self { pool, table })
    }

    /// Connects to a dedicated projection database.
    pub async fn connect(database_url: &str, table: impl Into<String>) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Self::new(pool, table)
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the projection table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                user_id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                source_updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            table = self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<UserNotification> {
        Ok(UserNotification {
            user_id: UserId::new(row.try_get("user_id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            source_updated_at: row.try_get::<DateTime<Utc>, _>("source_updated_at")?,
        })
    }
}

#[async_trait]
impl ProjectionStore for PostgresProjectionStore {
    async fn upsert(&self, record: UserNotification) -> Result<UpsertOutcome> {
        // xmax is 0 only for a freshly inserted tuple. No row comes back
        // when the WHERE guard rejects an older event.
        let sql = format!(
            r#"
            INSERT INTO {table} (user_id, name, email, updated_at, source_updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                updated_at = EXCLUDED.updated_at,
                source_updated_at = EXCLUDED.source_updated_at
            WHERE {table}.source_updated_at <= EXCLUDED.source_updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
            table = self.table
        );

        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(record.user_id.as_i64())
            .bind(&record.name)
            .bind(&record.email)
            .bind(record.updated_at)
            .bind(record.source_updated_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) if row.try_get::<bool, _>("inserted")? => Ok(UpsertOutcome::Inserted),
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Stale),
        }
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserNotification>> {
        let sql = format!(
            "SELECT user_id, name, email, updated_at, source_updated_at FROM {} WHERE user_id = $1",
            self.table
        );
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list(&self) -> Result<Vec<UserNotification>> {
        let sql = format!(
            "SELECT user_id, name, email, updated_at, source_updated_at FROM {} ORDER BY user_id",
            self.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(is_identifier("user_notifications"));
        assert!(is_identifier("_t1"));
    }

    #[test]
    fn rejects_anything_that_needs_quoting() {
        assert!(!is_identifier(""));
        assert!(!is_identifier("1table"));
        assert!(!is_identifier("users; DROP TABLE users"));
        assert!(!is_identifier("user-notifications"));
        assert!(!is_identifier(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn new_validates_table_name() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/notifications_db")
            .unwrap();
        assert!(matches!(
            PostgresProjectionStore::new(pool.clone(), "bad name"),
            Err(ProjectionError::InvalidTable(_))
        ));
        let store = PostgresProjectionStore::new(pool, "user_notifications").unwrap();
        assert_eq!(store.table(), "user_notifications");
    }
}
