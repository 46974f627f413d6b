use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::middleware::RequestStart;
use crate::analytics::{RequestMeta, VisitRecorder};
use crate::storage::Storage;

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    pub recorder: VisitRecorder,
    pub redirect_status: StatusCode,
}

/// Redirect to the original URL, recording the visit on the way out
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(short_id): Path<String>,
    Extension(RequestStart(request_start)): Extension<RequestStart>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let handler_start = Instant::now();

    let record = match state.storage.get(&short_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(err) => {
            tracing::error!(%short_id, error = %err, "redirect lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    let location = match HeaderValue::from_str(&record.original_url) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!(%short_id, "stored url is not a valid Location header");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    // Recording is best-effort: a failed visit record never blocks the
    // redirect, but the visit is durably stored before we answer.
    let meta = RequestMeta::from_request(&headers, addr.ip());
    if let Err(err) = state.recorder.record(&short_id, &meta).await {
        tracing::warn!(%short_id, error = %err, "failed to record visit");
    }

    let handler_time = handler_start.elapsed();
    let total_time = request_start.elapsed();

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::LOCATION, location);
    response_headers.insert(
        "x-tern-timing-total-ms",
        total_time.as_millis().to_string().parse().unwrap(),
    );
    response_headers.insert(
        "x-tern-timing-handler-ms",
        handler_time.as_millis().to_string().parse().unwrap(),
    );

    (state.redirect_status, response_headers).into_response()
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
