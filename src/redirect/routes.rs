use axum::{http::StatusCode, middleware, routing::get, Router};
use std::sync::Arc;

use crate::analytics::VisitRecorder;
use crate::storage::Storage;

use super::handlers::{health_check, redirect_url, RedirectState};
use super::middleware::record_request_start;

pub fn create_redirect_router(storage: Arc<dyn Storage>, redirect_status: StatusCode) -> Router {
    let recorder = VisitRecorder::new(Arc::clone(&storage));
    let state = Arc::new(RedirectState {
        storage,
        recorder,
        redirect_status,
    });

    Router::new()
        .route("/", get(health_check))
        .route("/{short_id}", get(redirect_url))
        .layer(middleware::from_fn(record_request_start))
        .with_state(state)
}
