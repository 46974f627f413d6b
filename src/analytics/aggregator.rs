//! Per-link analytics report assembly
//!
//! Reads the stored visit events for a short id and folds them into the
//! grouped summaries served by the analytics endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Local, Timelike};

use crate::analytics::models::{AnalyticsReport, Totals, UrlInfo, VisitEvent};
use crate::storage::{Storage, StorageError, StorageResult};

/// Upper bound on the `recentVisitors` list.
const RECENT_VISITORS_LIMIT: usize = 10;

pub struct AnalyticsAggregator {
    storage: Arc<dyn Storage>,
}

impl AnalyticsAggregator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Build the full report for a short id, or `NotFound`.
    pub async fn summarize(&self, short_id: &str) -> StorageResult<AnalyticsReport> {
        let record = self
            .storage
            .get(short_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let visits = self.storage.visits(short_id).await?;

        let mut browsers: HashMap<String, u64> = HashMap::new();
        let mut operating_systems: HashMap<String, u64> = HashMap::new();
        let mut devices: HashMap<String, u64> = HashMap::new();
        let mut hourly_clicks: BTreeMap<u32, u64> = BTreeMap::new();

        for visit in &visits {
            *browsers.entry(visit.browser.clone()).or_insert(0) += 1;
            *operating_systems.entry(visit.os.clone()).or_insert(0) += 1;
            *devices.entry(visit.device_type.clone()).or_insert(0) += 1;
            *hourly_clicks.entry(local_hour(visit.visited_at)).or_insert(0) += 1;
        }

        // `visits` is in append order; the tail holds the newest events,
        // which breaks ties between equal wall-clock timestamps.
        let recent_visitors: Vec<VisitEvent> = visits
            .iter()
            .rev()
            .take(RECENT_VISITORS_LIMIT)
            .cloned()
            .collect();

        Ok(AnalyticsReport {
            url_info: UrlInfo::from_record(&record),
            totals: Totals {
                click_count: record.clicks,
                unique_visitor_count: record.unique_visitors,
            },
            browsers,
            operating_systems,
            devices,
            hourly_clicks,
            recent_visitors,
        })
    }
}

/// Hour of day (0-23) of a unix timestamp, in local time.
fn local_hour(timestamp: i64) -> u32 {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&Local).hour())
        .unwrap_or(0)
}
