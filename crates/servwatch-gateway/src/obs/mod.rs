//! Lightweight in-process metrics.
//!
//! Counters, gauges and histograms are stored as atomics keyed by label sets
//! and rendered by the `/metrics` handler. `track_requests` is the axum
//! middleware that feeds the HTTP request counter.

pub mod metrics;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;

pub use metrics::{CounterVec, GatewayMetrics, GaugeVec, HistogramVec};

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    // Route template, not the raw path, to keep server ids out of label values.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let res = next.run(req).await;

    let status = res.status().as_u16().to_string();
    state.metrics().http_requests.inc(&[
        ("method", method.as_str()),
        ("route", route.as_str()),
        ("status", status.as_str()),
    ]);
    res
}
