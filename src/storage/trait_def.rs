use crate::models::Link;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error("short code not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Unavailable(other.into()),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable mapping from short code to link record.
///
/// Every method is atomic with respect to concurrent calls on the same code.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Insert `link` iff no record with the same code exists.
    /// Fails with `Conflict` and leaves the existing record untouched otherwise.
    async fn insert(&self, link: &Link) -> StorageResult<Link>;

    /// Fetch a record without modifying it.
    async fn find_by_code(&self, code: &str) -> StorageResult<Link>;

    /// Every record, newest `created_at` first; later insertions win ties.
    async fn list_all(&self) -> StorageResult<Vec<Link>>;

    /// Increment `clicks` and set `last_clicked = now` in one step,
    /// returning the record as it is after the update.
    async fn increment_and_touch(&self, code: &str, now: DateTime<Utc>) -> StorageResult<Link>;

    /// Remove a record and return it.
    async fn delete_by_code(&self, code: &str) -> StorageResult<Link>;
}
