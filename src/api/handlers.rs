use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{AnalyticsAggregator, AnalyticsReport};
use crate::models::{LinkRecord, ShortenRequest, ShortenResponse};
use crate::shortid;
use crate::storage::{Storage, StorageError};

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub aggregator: AnalyticsAggregator,
    pub public_origin: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Origin used to build absolute short URLs: the configured public
/// origin when set, otherwise the request's Host header.
fn short_origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(origin) = &state.public_origin {
        return origin.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// Create a new shortened URL
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let original_url = match payload.original_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return Err(bad_request("Original URL is required")),
    };

    let short_id = shortid::generate();

    match state.storage.create(&short_id, original_url).await {
        Ok(record) => Ok(Json(ShortenResponse {
            short_url: format!("{}/{}", short_origin(&state, &headers), record.short_id),
            short_id: record.short_id,
            original_url: record.original_url,
            created_at: record.created_at,
        })),
        Err(StorageError::InvalidUrl) => Err(bad_request("Original URL is required")),
        Err(StorageError::Conflict) => {
            tracing::error!(%short_id, "generated short id collided");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to allocate a short id".to_string(),
                }),
            ))
        }
        Err(err) => {
            tracing::error!(%short_id, error = %err, "failed to create short url");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create short URL".to_string(),
                }),
            ))
        }
    }
}

/// Analytics report for a short id
pub async fn link_analytics(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> Result<Json<AnalyticsReport>, (StatusCode, Json<ErrorResponse>)> {
    match state.aggregator.summarize(&short_id).await {
        Ok(report) => Ok(Json(report)),
        Err(StorageError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "URL not found".to_string(),
            }),
        )),
        Err(err) => {
            tracing::error!(%short_id, error = %err, "failed to build analytics report");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve analytics".to_string(),
                }),
            ))
        }
    }
}

/// List shortened URLs, newest first
pub async fn list_urls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LinkRecord>>, (StatusCode, Json<ErrorResponse>)> {
    match state.storage.list(query.limit, query.offset).await {
        Ok(records) => Ok(Json(records)),
        Err(err) => {
            tracing::error!(error = %err, "failed to list urls");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to list URLs".to_string(),
                }),
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
