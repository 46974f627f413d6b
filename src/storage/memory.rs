use crate::analytics::models::VisitEvent;
use crate::models::LinkRecord;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory storage backed by a concurrent map.
///
/// Every mutation goes through a `DashMap` entry, so per-id counter
/// updates are serialized by the shard lock and never lost. No shard
/// lock is held across an await point.
pub struct MemoryStorage {
    records: DashMap<String, MemoryRecord>,
    next_id: AtomicI64,
}

struct MemoryRecord {
    id: i64,
    original_url: String,
    created_at: i64,
    clicks: i64,
    visitors: HashSet<String>,
    visits: Vec<VisitEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn to_link_record(short_id: &str, record: &MemoryRecord) -> LinkRecord {
    LinkRecord {
        id: record.id,
        short_id: short_id.to_string(),
        original_url: record.original_url.clone(),
        created_at: record.created_at,
        clicks: record.clicks,
        unique_visitors: record.visitors.len() as i64,
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn create(&self, short_id: &str, original_url: &str) -> StorageResult<LinkRecord> {
        if original_url.is_empty() {
            return Err(StorageError::InvalidUrl);
        }

        match self.records.entry(short_id.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict),
            Entry::Vacant(slot) => {
                let record = MemoryRecord {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    original_url: original_url.to_string(),
                    created_at: chrono::Utc::now().timestamp(),
                    clicks: 0,
                    visitors: HashSet::new(),
                    visits: Vec::new(),
                };
                let created = to_link_record(short_id, &record);
                slot.insert(record);
                Ok(created)
            }
        }
    }

    async fn get(&self, short_id: &str) -> Result<Option<LinkRecord>> {
        Ok(self
            .records
            .get(short_id)
            .map(|entry| to_link_record(entry.key(), entry.value())))
    }

    async fn increment_click(&self, short_id: &str) -> StorageResult<i64> {
        let mut entry = self
            .records
            .get_mut(short_id)
            .ok_or(StorageError::NotFound)?;
        entry.clicks += 1;
        Ok(entry.clicks)
    }

    async fn record_unique_visitor(
        &self,
        short_id: &str,
        visitor_key: &str,
    ) -> StorageResult<i64> {
        let mut entry = self
            .records
            .get_mut(short_id)
            .ok_or(StorageError::NotFound)?;
        entry.visitors.insert(visitor_key.to_string());
        Ok(entry.visitors.len() as i64)
    }

    async fn append_visit(&self, visit: &VisitEvent) -> StorageResult<()> {
        let mut entry = self
            .records
            .get_mut(&visit.short_id)
            .ok_or(StorageError::NotFound)?;
        entry.visits.push(visit.clone());
        Ok(())
    }

    async fn visits(&self, short_id: &str) -> Result<Vec<VisitEvent>> {
        Ok(self
            .records
            .get(short_id)
            .map(|entry| entry.visits.clone())
            .unwrap_or_default())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LinkRecord>> {
        let mut records: Vec<LinkRecord> = self
            .records
            .iter()
            .map(|entry| to_link_record(entry.key(), entry.value()))
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
