use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::analytics::AnalyticsAggregator;
use crate::storage::Storage;

use super::handlers::{health_check, link_analytics, list_urls, shorten_url, AppState};

pub fn create_api_router(storage: Arc<dyn Storage>, public_origin: Option<String>) -> Router {
    let aggregator = AnalyticsAggregator::new(Arc::clone(&storage));
    let state = Arc::new(AppState {
        storage,
        aggregator,
        public_origin,
    });

    Router::new()
        .route("/shorten", post(shorten_url))
        .route("/analytics/{short_id}", get(link_analytics))
        .route("/urls", get(list_urls))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
