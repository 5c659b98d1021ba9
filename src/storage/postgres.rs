use crate::models::Link;
use crate::storage::row::LinkRow;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id BIGSERIAL PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                clicks BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL,
                last_clicked BIGINT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_created_at ON links(created_at)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert(&self, link: &Link) -> StorageResult<Link> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (code, url, clicks, created_at, last_clicked)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(code) DO NOTHING
            RETURNING code, url, clicks, created_at, last_clicked
            "#,
        )
        .bind(&link.code)
        .bind(&link.url)
        .bind(link.clicks)
        .bind(link.created_at.timestamp_millis())
        .bind(link.last_clicked.map(|t| t.timestamp_millis()))
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()?.ok_or(StorageError::Conflict)
    }

    async fn find_by_code(&self, code: &str) -> StorageResult<Link> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT code, url, clicks, created_at, last_clicked
            FROM links
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()?.ok_or(StorageError::NotFound)
    }

    async fn list_all(&self) -> StorageResult<Vec<Link>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT code, url, clicks, created_at, last_clicked
            FROM links
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Link::try_from).collect()
    }

    async fn increment_and_touch(&self, code: &str, now: DateTime<Utc>) -> StorageResult<Link> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            UPDATE links
            SET clicks = clicks + 1, last_clicked = $1
            WHERE code = $2
            RETURNING code, url, clicks, created_at, last_clicked
            "#,
        )
        .bind(now.timestamp_millis())
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()?.ok_or(StorageError::NotFound)
    }

    async fn delete_by_code(&self, code: &str) -> StorageResult<Link> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            DELETE FROM links
            WHERE code = $1
            RETURNING code, url, clicks, created_at, last_clicked
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()?.ok_or(StorageError::NotFound)
    }
}
