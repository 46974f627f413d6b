use crate::analytics::models::VisitEvent;
use crate::models::LinkRecord;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("original url must not be empty")]
    InvalidUrl,
    #[error("short id already exists")]
    Conflict,
    #[error("short id not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Persist a new link record under a caller-provided short id.
    ///
    /// Counters start at zero. Fails with `InvalidUrl` for an empty
    /// original URL and `Conflict` for a duplicate short id.
    async fn create(&self, short_id: &str, original_url: &str) -> StorageResult<LinkRecord>;

    /// Get a link record by short id
    async fn get(&self, short_id: &str) -> Result<Option<LinkRecord>>;

    /// Atomically increment the click counter, returning the new count
    async fn increment_click(&self, short_id: &str) -> StorageResult<i64>;

    /// Add a visitor key to the per-id visitor set if absent, returning
    /// the updated cardinality either way
    async fn record_unique_visitor(&self, short_id: &str, visitor_key: &str)
        -> StorageResult<i64>;

    /// Append a visit event to the per-id event log
    async fn append_visit(&self, visit: &VisitEvent) -> StorageResult<()>;

    /// All visit events for a short id, in append order
    async fn visits(&self, short_id: &str) -> Result<Vec<VisitEvent>>;

    /// List link records, newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LinkRecord>>;
}
