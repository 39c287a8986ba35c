//! Prometheus metrics for the Strak API.
//!
//! HTTP request collectors are fed by `MetricsMiddleware`; cache collectors by
//! `ContentCache`. Pool gauges are registered by `db-pool`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// HTTP requests by method, matched route pattern and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "strak_http_requests_total",
        "Total HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register strak_http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "strak_http_request_duration_seconds",
        "HTTP request latency segmented by method and route",
        &["method", "route"]
    )
    .expect("failed to register strak_http_request_duration_seconds");

    /// Cache lookups by entity (post, profile) and outcome (hit, miss, error).
    pub static ref CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "strak_cache_events_total",
        "Cache events segmented by entity and outcome",
        &["entity", "event"]
    )
    .expect("failed to register strak_cache_events_total");
}

pub fn record_request(method: &str, route: &str, status: u16, elapsed_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed_secs);
}

pub fn record_cache_event(entity: &str, event: &str) {
    CACHE_EVENTS.with_label_values(&[entity, event]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
