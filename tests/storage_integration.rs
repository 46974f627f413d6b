//! Storage contract tests
//!
//! Runs the same contract against the in-memory backend and the SQLite
//! backend so both stay interchangeable behind the `Storage` trait.

use std::sync::Arc;

use tern::analytics::VisitEvent;
use tern::storage::{MemoryStorage, SqliteStorage, Storage, StorageError};

fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new())
}

async fn sqlite_storage() -> Arc<dyn Storage> {
    // A single connection keeps every query on the same in-memory database.
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn visit(short_id: &str, visitor_ip: &str, user_agent: &str) -> VisitEvent {
    VisitEvent {
        short_id: short_id.to_string(),
        visitor_ip: Some(visitor_ip.to_string()),
        user_agent: Some(user_agent.to_string()),
        referrer: "direct".to_string(),
        browser: "Chrome".to_string(),
        os: "Windows".to_string(),
        device_type: "Desktop".to_string(),
        visited_at: chrono::Utc::now().timestamp(),
    }
}

async fn assert_create_roundtrip(storage: Arc<dyn Storage>) {
    let created = storage
        .create("abc1234", "https://example.com/destination")
        .await
        .unwrap();
    assert_eq!(created.short_id, "abc1234");
    assert_eq!(created.original_url, "https://example.com/destination");
    assert_eq!(created.clicks, 0);
    assert_eq!(created.unique_visitors, 0);

    let fetched = storage.get("abc1234").await.unwrap().unwrap();
    assert_eq!(fetched.original_url, "https://example.com/destination");
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn memory_create_roundtrip() {
    assert_create_roundtrip(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_create_roundtrip() {
    assert_create_roundtrip(sqlite_storage().await).await;
}

async fn assert_empty_url_rejected(storage: Arc<dyn Storage>) {
    let err = storage.create("abc1234", "").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidUrl));
    assert!(storage.get("abc1234").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_empty_url_rejected() {
    assert_empty_url_rejected(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_empty_url_rejected() {
    assert_empty_url_rejected(sqlite_storage().await).await;
}

async fn assert_duplicate_id_conflicts(storage: Arc<dyn Storage>) {
    storage.create("abc1234", "https://one.example").await.unwrap();
    let err = storage
        .create("abc1234", "https://two.example")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    // The original mapping survives the rejected create.
    let record = storage.get("abc1234").await.unwrap().unwrap();
    assert_eq!(record.original_url, "https://one.example");
}

#[tokio::test]
async fn memory_duplicate_id_conflicts() {
    assert_duplicate_id_conflicts(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_duplicate_id_conflicts() {
    assert_duplicate_id_conflicts(sqlite_storage().await).await;
}

async fn assert_counters(storage: Arc<dyn Storage>) {
    storage.create("abc1234", "https://example.com").await.unwrap();

    assert_eq!(storage.increment_click("abc1234").await.unwrap(), 1);
    assert_eq!(storage.increment_click("abc1234").await.unwrap(), 2);

    // Same key twice counts once; cardinality is returned either way.
    assert_eq!(
        storage
            .record_unique_visitor("abc1234", "203.0.113.1")
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        storage
            .record_unique_visitor("abc1234", "203.0.113.1")
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        storage
            .record_unique_visitor("abc1234", "203.0.113.2")
            .await
            .unwrap(),
        2
    );

    let record = storage.get("abc1234").await.unwrap().unwrap();
    assert_eq!(record.clicks, 2);
    assert_eq!(record.unique_visitors, 2);
}

#[tokio::test]
async fn memory_counters() {
    assert_counters(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_counters() {
    assert_counters(sqlite_storage().await).await;
}

async fn assert_unknown_id_not_found(storage: Arc<dyn Storage>) {
    assert!(matches!(
        storage.increment_click("missing").await.unwrap_err(),
        StorageError::NotFound
    ));
    assert!(matches!(
        storage
            .record_unique_visitor("missing", "203.0.113.1")
            .await
            .unwrap_err(),
        StorageError::NotFound
    ));
    assert!(matches!(
        storage
            .append_visit(&visit("missing", "203.0.113.1", "agent"))
            .await
            .unwrap_err(),
        StorageError::NotFound
    ));
}

#[tokio::test]
async fn memory_unknown_id_not_found() {
    assert_unknown_id_not_found(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_unknown_id_not_found() {
    assert_unknown_id_not_found(sqlite_storage().await).await;
}

async fn assert_visits_keep_append_order(storage: Arc<dyn Storage>) {
    storage.create("abc1234", "https://example.com").await.unwrap();

    for i in 0..5 {
        storage
            .append_visit(&visit("abc1234", "203.0.113.1", &format!("agent-{i}")))
            .await
            .unwrap();
    }

    let visits = storage.visits("abc1234").await.unwrap();
    assert_eq!(visits.len(), 5);
    for (i, event) in visits.iter().enumerate() {
        assert_eq!(event.user_agent.as_deref(), Some(format!("agent-{i}").as_str()));
        assert_eq!(event.short_id, "abc1234");
    }
}

#[tokio::test]
async fn memory_visits_keep_append_order() {
    assert_visits_keep_append_order(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_visits_keep_append_order() {
    assert_visits_keep_append_order(sqlite_storage().await).await;
}

async fn assert_concurrent_clicks_lose_nothing(storage: Arc<dyn Storage>) {
    storage.create("popular", "https://example.com").await.unwrap();

    let mut handles = vec![];
    for _ in 0..50 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage.increment_click("popular").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let record = storage.get("popular").await.unwrap().unwrap();
    assert_eq!(record.clicks, 50);
}

#[tokio::test]
async fn memory_concurrent_clicks_lose_nothing() {
    assert_concurrent_clicks_lose_nothing(memory_storage()).await;
}

#[tokio::test]
async fn sqlite_concurrent_clicks_lose_nothing() {
    assert_concurrent_clicks_lose_nothing(sqlite_storage().await).await;
}

#[tokio::test]
async fn sqlite_list_is_newest_first() {
    let storage = sqlite_storage().await;

    for i in 0..5 {
        storage
            .create(&format!("link_{i}"), &format!("https://example.com/{i}"))
            .await
            .unwrap();
    }

    let listed = storage.list(3, 0).await.unwrap();
    assert_eq!(listed.len(), 3);
    // Same-second creates fall back to insertion order, newest first.
    assert_eq!(listed[0].short_id, "link_4");
    assert_eq!(listed[1].short_id, "link_3");
    assert_eq!(listed[2].short_id, "link_2");

    let page_two = storage.list(3, 3).await.unwrap();
    assert_eq!(page_two.len(), 2);
    assert_eq!(page_two[0].short_id, "link_1");
}

#[tokio::test]
async fn memory_list_is_newest_first() {
    let storage = memory_storage();

    for i in 0..5 {
        storage
            .create(&format!("link_{i}"), &format!("https://example.com/{i}"))
            .await
            .unwrap();
    }

    let listed = storage.list(10, 0).await.unwrap();
    assert_eq!(listed.len(), 5);
    assert_eq!(listed[0].short_id, "link_4");
    assert_eq!(listed[4].short_id, "link_0");
}
