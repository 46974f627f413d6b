//! Data models for visit analytics

use axum::http::{header, HeaderMap};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use crate::models::LinkRecord;

/// Raw request metadata captured by the HTTP layer, before classification.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl RequestMeta {
    pub fn from_request(headers: &HeaderMap, socket_addr: IpAddr) -> Self {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            client_ip: Some(crate::analytics::ip::client_ip(headers, socket_addr)),
            user_agent: header_str(header::USER_AGENT),
            referrer: header_str(header::REFERER),
        }
    }
}

/// One recorded resolution of a short id. Append-only.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    pub short_id: String,
    pub visitor_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: String,
    pub browser: String,
    pub os: String,
    pub device_type: String,
    pub visited_at: i64,
}

impl VisitEvent {
    /// Key used for unique-visitor counting: client IP when known,
    /// user-agent otherwise.
    pub fn visitor_key(&self) -> &str {
        self.visitor_ip
            .as_deref()
            .or(self.user_agent.as_deref())
            .unwrap_or("unknown")
    }
}

/// Full analytics report for one short id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub url_info: UrlInfo,
    pub totals: Totals,
    pub browsers: HashMap<String, u64>,
    pub operating_systems: HashMap<String, u64>,
    pub devices: HashMap<String, u64>,
    /// Hour of day (0-23, local time) to click count
    pub hourly_clicks: BTreeMap<u32, u64>,
    /// Last ten visits, most recent first
    pub recent_visitors: Vec<VisitEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfo {
    pub original_url: String,
    pub created_at: i64,
    pub short_id: String,
}

impl UrlInfo {
    pub fn from_record(record: &LinkRecord) -> Self {
        Self {
            original_url: record.original_url.clone(),
            created_at: record.created_at,
            short_id: record.short_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub click_count: i64,
    pub unique_visitor_count: i64,
}
