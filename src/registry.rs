//! Link lifecycle: creation with collision handling, lookup, deletion and
//! click-counted resolution.
//!
//! The registry holds no locks and caches nothing. Uniqueness rests on
//! [`Storage::insert`] being atomic, and click counting on
//! [`Storage::increment_and_touch`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::codegen::{CodeGenerator, RandomCodeGenerator};
use crate::models::Link;
use crate::storage::{Storage, StorageError};
use crate::validate::{is_reserved_code, is_valid_code, is_valid_url};

/// Attempts made to find a free generated code before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid url")]
    InvalidUrl,
    #[error("code must match [A-Za-z0-9]{{6,8}}")]
    InvalidCode,
    #[error("code already exists: {0}")]
    CodeConflict(String),
    #[error("no free code found after {0} attempts")]
    CodeSpaceExhausted(usize),
    #[error("not found")]
    NotFound,
    #[error("storage unavailable")]
    StorageUnavailable(#[source] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Lift a storage failure from an operation on `code`.
    fn from_storage(code: &str, err: StorageError) -> Self {
        match err {
            StorageError::Conflict => RegistryError::CodeConflict(code.to_string()),
            StorageError::NotFound => RegistryError::NotFound,
            StorageError::Unavailable(source) => RegistryError::StorageUnavailable(source),
        }
    }
}

pub struct LinkRegistry {
    storage: Arc<dyn Storage>,
    generator: Arc<dyn CodeGenerator>,
}

impl LinkRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_generator(storage, Arc::new(RandomCodeGenerator))
    }

    pub fn with_generator(storage: Arc<dyn Storage>, generator: Arc<dyn CodeGenerator>) -> Self {
        Self { storage, generator }
    }

    /// Create a link for `url`, under `code` if given or a generated code otherwise.
    ///
    /// A caller-chosen code is never remapped: if it is taken the call fails
    /// with [`RegistryError::CodeConflict`].
    pub async fn create(&self, url: &str, code: Option<&str>) -> RegistryResult<Link> {
        self.create_at(url, code, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        url: &str,
        code: Option<&str>,
        now: DateTime<Utc>,
    ) -> RegistryResult<Link> {
        if url.is_empty() || !is_valid_url(url) {
            return Err(RegistryError::InvalidUrl);
        }

        match code {
            Some(code) => self.create_with_code(url, code, now).await,
            None => self.create_with_generated_code(url, now).await,
        }
    }

    async fn create_with_code(
        &self,
        url: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Link> {
        if !is_valid_code(code) {
            return Err(RegistryError::InvalidCode);
        }
        if is_reserved_code(code) {
            return Err(RegistryError::CodeConflict(code.to_string()));
        }

        self.storage
            .insert(&Link::new(code, url, now))
            .await
            .map_err(|err| RegistryError::from_storage(code, err))
    }

    async fn create_with_generated_code(
        &self,
        url: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Link> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate();
            if is_reserved_code(&candidate) {
                tracing::debug!(attempt, code = %candidate, "generated reserved code, retrying");
                continue;
            }

            match self.storage.insert(&Link::new(candidate.as_str(), url, now)).await {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict) => {
                    tracing::debug!(attempt, code = %candidate, "generated code collided, retrying");
                }
                Err(err) => return Err(RegistryError::from_storage(&candidate, err)),
            }
        }

        tracing::warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "failed to find a free short code"
        );
        Err(RegistryError::CodeSpaceExhausted(MAX_GENERATION_ATTEMPTS))
    }

    /// All links, newest first.
    pub async fn list(&self) -> RegistryResult<Vec<Link>> {
        self.storage.list_all().await.map_err(|err| match err {
            StorageError::Unavailable(source) => RegistryError::StorageUnavailable(source),
            other => RegistryError::StorageUnavailable(other.into()),
        })
    }

    /// Read a link without counting a visit.
    pub async fn get(&self, code: &str) -> RegistryResult<Link> {
        self.storage
            .find_by_code(code)
            .await
            .map_err(|err| RegistryError::from_storage(code, err))
    }

    /// Remove a link, returning the record as it was.
    pub async fn delete(&self, code: &str) -> RegistryResult<Link> {
        self.storage
            .delete_by_code(code)
            .await
            .map_err(|err| RegistryError::from_storage(code, err))
    }

    /// Count a visit to `code` and return the updated record.
    ///
    /// Malformed codes fail with [`RegistryError::InvalidCode`] without
    /// reaching storage. Transports should present that the same as
    /// [`RegistryError::NotFound`].
    pub async fn resolve_and_count(&self, code: &str, now: DateTime<Utc>) -> RegistryResult<Link> {
        if !is_valid_code(code) {
            return Err(RegistryError::InvalidCode);
        }

        self.storage
            .increment_and_touch(code, now)
            .await
            .map_err(|err| RegistryError::from_storage(code, err))
    }
}
