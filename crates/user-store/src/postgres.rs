use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Result, UserFields, UserId, UserRecord, UserStoreError, store::UserStore};

/// PostgreSQL-backed authoritative user store.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Creates a new PostgreSQL user store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `users` table if it does not exist yet.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<UserRecord> {
        Ok(UserRecord {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, fields: UserFields) -> Result<UserRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, updated_at)
            VALUES ($1, $2, clock_timestamp())
            RETURNING id, name, email, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_user(row)
    }

    async fn update(&self, id: UserId, fields: UserFields) -> Result<UserRecord> {
        // CURRENT_TIMESTAMP is the transaction start, which can be older than
        // a concurrent update that committed first. The row lock orders
        // updates, and the new stamp is taken after it is acquired.
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE users
            SET name = $1,
                email = $2,
                updated_at = GREATEST(clock_timestamp(), users.updated_at + interval '1 microsecond')
            WHERE id = $3
            RETURNING id, name, email, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_user(row),
            None => Err(UserStoreError::NotFound(id)),
        }
    }

    async fn get(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, email, updated_at FROM users WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query("SELECT id, name, email, updated_at FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_user).collect()
    }
}
