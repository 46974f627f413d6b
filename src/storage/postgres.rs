use crate::analytics::models::VisitEvent;
use crate::models::LinkRecord;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn url_id(&self, short_id: &str) -> StorageResult<i64> {
        let url_id: Option<i64> = sqlx::query_scalar("SELECT id FROM urls WHERE short_id = $1")
            .bind(short_id)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        url_id.ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id BIGSERIAL PRIMARY KEY,
                short_id TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                clicks BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_urls_short_id ON urls(short_id)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics (
                id BIGSERIAL PRIMARY KEY,
                url_id BIGINT NOT NULL REFERENCES urls(id) ON DELETE CASCADE,
                visitor_ip TEXT,
                user_agent TEXT,
                referrer TEXT NOT NULL DEFAULT 'direct',
                browser TEXT NOT NULL,
                os TEXT NOT NULL,
                device_type TEXT NOT NULL,
                visited_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_analytics_url_id ON analytics(url_id)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitors (
                url_id BIGINT NOT NULL REFERENCES urls(id) ON DELETE CASCADE,
                visitor_key TEXT NOT NULL,
                PRIMARY KEY (url_id, visitor_key)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create(&self, short_id: &str, original_url: &str) -> StorageResult<LinkRecord> {
        if original_url.is_empty() {
            return Err(StorageError::InvalidUrl);
        }

        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO urls (short_id, original_url, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (short_id) DO NOTHING
            "#,
        )
        .bind(short_id)
        .bind(original_url)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT u.id, u.short_id, u.original_url, u.created_at, u.clicks,
                   (SELECT COUNT(*) FROM visitors v WHERE v.url_id = u.id) AS unique_visitors
            FROM urls u
            WHERE u.short_id = $1
            "#,
        )
        .bind(short_id)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(record)
    }

    async fn get(&self, short_id: &str) -> Result<Option<LinkRecord>> {
        let record = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT u.id, u.short_id, u.original_url, u.created_at, u.clicks,
                   (SELECT COUNT(*) FROM visitors v WHERE v.url_id = u.id) AS unique_visitors
            FROM urls u
            WHERE u.short_id = $1
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn increment_click(&self, short_id: &str) -> StorageResult<i64> {
        let clicks: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE urls
            SET clicks = clicks + 1
            WHERE short_id = $1
            RETURNING clicks
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        clicks.ok_or(StorageError::NotFound)
    }

    async fn record_unique_visitor(
        &self,
        short_id: &str,
        visitor_key: &str,
    ) -> StorageResult<i64> {
        let url_id = self.url_id(short_id).await?;

        sqlx::query(
            r#"
            INSERT INTO visitors (url_id, visitor_key)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(url_id)
        .bind(visitor_key)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE url_id = $1")
            .bind(url_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        Ok(count)
    }

    async fn append_visit(&self, visit: &VisitEvent) -> StorageResult<()> {
        let url_id = self.url_id(&visit.short_id).await?;

        sqlx::query(
            r#"
            INSERT INTO analytics
                (url_id, visitor_ip, user_agent, referrer, browser, os, device_type, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(url_id)
        .bind(visit.visitor_ip.as_deref())
        .bind(visit.user_agent.as_deref())
        .bind(&visit.referrer)
        .bind(&visit.browser)
        .bind(&visit.os)
        .bind(&visit.device_type)
        .bind(visit.visited_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(())
    }

    async fn visits(&self, short_id: &str) -> Result<Vec<VisitEvent>> {
        let visits = sqlx::query_as::<_, VisitEvent>(
            r#"
            SELECT u.short_id, a.visitor_ip, a.user_agent, a.referrer,
                   a.browser, a.os, a.device_type, a.visited_at
            FROM analytics a
            JOIN urls u ON u.id = a.url_id
            WHERE u.short_id = $1
            ORDER BY a.id ASC
            "#,
        )
        .bind(short_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<LinkRecord>> {
        let records = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT u.id, u.short_id, u.original_url, u.created_at, u.clicks,
                   (SELECT COUNT(*) FROM visitors v WHERE v.url_id = u.id) AS unique_visitors
            FROM urls u
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }
}
