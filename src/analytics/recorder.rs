//! Visit recording

use std::sync::Arc;

use crate::analytics::classifier::{self, Classification, UNKNOWN_DEVICE};
use crate::analytics::models::{RequestMeta, VisitEvent};
use crate::storage::{Storage, StorageResult};

/// Records one visit per resolved redirect: classifies the request,
/// appends the visit event, then bumps the click and unique-visitor
/// counters.
pub struct VisitRecorder {
    storage: Arc<dyn Storage>,
}

impl VisitRecorder {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Record a visit to `short_id`.
    ///
    /// The caller has already resolved the id; an id that disappeared in
    /// the meantime surfaces as `NotFound` and is the caller's decision
    /// to swallow or propagate.
    pub async fn record(&self, short_id: &str, meta: &RequestMeta) -> StorageResult<()> {
        let visit = build_visit(short_id, meta);
        let visitor_key = visit.visitor_key().to_string();

        self.storage.append_visit(&visit).await?;
        self.storage.increment_click(short_id).await?;
        self.storage
            .record_unique_visitor(short_id, &visitor_key)
            .await?;

        Ok(())
    }
}

fn build_visit(short_id: &str, meta: &RequestMeta) -> VisitEvent {
    // A missing user-agent collapses the whole triple to the sentinel.
    let (browser, os, device_type) = match classifier::classify(meta.user_agent.as_deref()) {
        Classification::Known(profile) => (
            profile.browser.to_string(),
            profile.os.to_string(),
            profile.device_type.to_string(),
        ),
        Classification::UnknownDevice => (
            UNKNOWN_DEVICE.to_string(),
            UNKNOWN_DEVICE.to_string(),
            UNKNOWN_DEVICE.to_string(),
        ),
    };

    VisitEvent {
        short_id: short_id.to_string(),
        visitor_ip: meta.client_ip.map(|ip| ip.to_string()),
        user_agent: meta.user_agent.clone(),
        referrer: meta
            .referrer
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "direct".to_string()),
        browser,
        os,
        device_type,
        visited_at: chrono::Utc::now().timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    fn meta(ip: Option<&str>, user_agent: Option<&str>) -> RequestMeta {
        RequestMeta {
            client_ip: ip.map(|s| s.parse().unwrap()),
            user_agent: user_agent.map(str::to_string),
            referrer: None,
        }
    }

    async fn storage_with(short_id: &str) -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage.create(short_id, "https://example.com").await.unwrap();
        storage
    }

    #[tokio::test]
    async fn record_appends_event_and_bumps_counters() {
        let storage = storage_with("abc1234").await;
        let recorder = VisitRecorder::new(storage.clone());

        recorder
            .record("abc1234", &meta(Some("203.0.113.1"), Some(CHROME_WINDOWS)))
            .await
            .unwrap();

        let record = storage.get("abc1234").await.unwrap().unwrap();
        assert_eq!(record.clicks, 1);
        assert_eq!(record.unique_visitors, 1);

        let visits = storage.visits("abc1234").await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].browser, "Chrome");
        assert_eq!(visits[0].os, "Windows");
        assert_eq!(visits[0].device_type, "Desktop");
        assert_eq!(visits[0].referrer, "direct");
    }

    #[tokio::test]
    async fn repeat_visitor_counts_once() {
        let storage = storage_with("abc1234").await;
        let recorder = VisitRecorder::new(storage.clone());
        let visitor = meta(Some("203.0.113.1"), Some(CHROME_WINDOWS));

        recorder.record("abc1234", &visitor).await.unwrap();
        recorder.record("abc1234", &visitor).await.unwrap();

        let record = storage.get("abc1234").await.unwrap().unwrap();
        assert_eq!(record.clicks, 2);
        assert_eq!(record.unique_visitors, 1);
    }

    #[tokio::test]
    async fn visitor_key_falls_back_to_user_agent_without_ip() {
        let storage = storage_with("abc1234").await;
        let recorder = VisitRecorder::new(storage.clone());

        for ua in ["agent-one", "agent-two", "agent-two"] {
            recorder.record("abc1234", &meta(None, Some(ua))).await.unwrap();
        }

        let record = storage.get("abc1234").await.unwrap().unwrap();
        assert_eq!(record.clicks, 3);
        assert_eq!(record.unique_visitors, 2);
    }

    #[tokio::test]
    async fn missing_user_agent_records_the_sentinel() {
        let storage = storage_with("abc1234").await;
        let recorder = VisitRecorder::new(storage.clone());

        recorder
            .record("abc1234", &meta(Some("203.0.113.1"), None))
            .await
            .unwrap();

        let visits = storage.visits("abc1234").await.unwrap();
        assert_eq!(visits[0].browser, UNKNOWN_DEVICE);
        assert_eq!(visits[0].os, UNKNOWN_DEVICE);
        assert_eq!(visits[0].device_type, UNKNOWN_DEVICE);
    }

    #[tokio::test]
    async fn unknown_short_id_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let recorder = VisitRecorder::new(storage.clone());

        let err = recorder
            .record("missing", &meta(Some("203.0.113.1"), Some(CHROME_WINDOWS)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
