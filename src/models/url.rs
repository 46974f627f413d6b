use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub id: i64,
    pub short_id: String,
    pub original_url: String,
    pub created_at: i64,
    pub clicks: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(rename = "originalUrl", default)]
    pub original_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_id: String,
    pub original_url: String,
    pub created_at: i64,
}
