use crate::models::Link;
use crate::storage::StorageError;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A `links` row as stored by the SQL backends. Timestamps are epoch milliseconds.
#[derive(Debug, FromRow)]
pub(crate) struct LinkRow {
    pub code: String,
    pub url: String,
    pub clicks: i64,
    pub created_at: i64,
    pub last_clicked: Option<i64>,
}

impl TryFrom<LinkRow> for Link {
    type Error = StorageError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let created_at = from_millis(&row.code, row.created_at)?;
        let last_clicked = row
            .last_clicked
            .map(|millis| from_millis(&row.code, millis))
            .transpose()?;

        Ok(Link {
            code: row.code,
            url: row.url,
            clicks: row.clicks,
            created_at,
            last_clicked,
        })
    }
}

fn from_millis(code: &str, millis: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        tracing::warn!(code, millis, "stored timestamp out of range");
        StorageError::Unavailable(anyhow!(
            "stored timestamp {millis} for {code} is out of range"
        ))
    })
}
