use axum::http::header;
use axum::response::IntoResponse;
use prometheus::TEXT_FORMAT;

use crate::services::metrics::get_metrics;

/// Prometheus scrape endpoint in the text exposition format.
pub async fn metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], get_metrics())
}
