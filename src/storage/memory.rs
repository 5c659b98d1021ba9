use crate::models::Link;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Entry {
    link: Link,
    /// Insertion order, used to break `created_at` ties.
    seq: u64,
}

/// Process-local storage backed by a sharded map.
///
/// Each operation holds the shard lock for its key for the whole
/// check-and-mutate step, so per-code operations never interleave.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    links: DashMap<String, Entry>,
    next_seq: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, link: &Link) -> StorageResult<Link> {
        match self.links.entry(link.code.clone()) {
            MapEntry::Occupied(_) => Err(StorageError::Conflict),
            MapEntry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Entry {
                    link: link.clone(),
                    seq,
                });
                Ok(link.clone())
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> StorageResult<Link> {
        self.links
            .get(code)
            .map(|entry| entry.link.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_all(&self) -> StorageResult<Vec<Link>> {
        let mut entries: Vec<Entry> = self.links.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            b.link
                .created_at
                .cmp(&a.link.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(entries.into_iter().map(|e| e.link).collect())
    }

    async fn increment_and_touch(&self, code: &str, now: DateTime<Utc>) -> StorageResult<Link> {
        let mut entry = self.links.get_mut(code).ok_or(StorageError::NotFound)?;
        entry.link.clicks += 1;
        entry.link.last_clicked = Some(now);
        Ok(entry.link.clone())
    }

    async fn delete_by_code(&self, code: &str) -> StorageResult<Link> {
        self.links
            .remove(code)
            .map(|(_, entry)| entry.link)
            .ok_or(StorageError::NotFound)
    }
}
