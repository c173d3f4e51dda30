//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rewrite_requests_total` (counter): requests seen by the rewrite layer,
//!   labelled by `outcome` (`rewritten`, `unmatched`, `skipped`, `invalid`)
//! - `gateway_requests_total` (counter): upstream requests by method, status
//! - `gateway_request_duration_seconds` (histogram): upstream latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// What the rewrite layer did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten,
    Unmatched,
    Skipped,
    /// A rule matched but its expansion is not a valid request target.
    Invalid,
}

impl RewriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteOutcome::Rewritten => "rewritten",
            RewriteOutcome::Unmatched => "unmatched",
            RewriteOutcome::Skipped => "skipped",
            RewriteOutcome::Invalid => "invalid",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rewrite(outcome: RewriteOutcome) {
    metrics::counter!("rewrite_requests_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
