//! Metric family schema shared by both services.
//!
//! Every label here comes from a small enumerable set: route template,
//! method, numeric status code, or peer service name. Raw paths never reach
//! a label.

use echopulse_core::metrics::{FamilySpec, MetricKind, MetricsRegistry};
use echopulse_core::Result;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";
pub const HTTP_RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";
pub const DEPENDENCY_DURATION_SECONDS: &str = "dependency_duration_seconds";

/// Content type served by `/metrics`.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Request latency bounds, 10ms to 5s.
const LATENCY_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];

/// Response size bounds, 100B to 10MB in decade steps.
const SIZE_BUCKETS: [f64; 6] = [
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
];

/// Outbound call latency bounds.
const DEPENDENCY_BUCKETS: [f64; 5] = [0.05, 0.1, 0.5, 1.0, 2.0];

/// Register the HTTP instrumentation families.
///
/// Called exactly once per registry at startup; a duplicate means the
/// service is wired twice and must not come up.
pub fn register_http_families(registry: &MetricsRegistry) -> Result<()> {
    registry.register(FamilySpec {
        name: HTTP_REQUESTS_TOTAL,
        help: "Number of requests received by route, method, and status code.",
        kind: MetricKind::Counter,
        labels: &["route", "method", "status"],
        buckets: &[],
    })?;
    registry.register(FamilySpec {
        name: HTTP_REQUEST_DURATION_SECONDS,
        help: "HTTP request duration in seconds.",
        kind: MetricKind::Histogram,
        labels: &["route", "method"],
        buckets: &LATENCY_BUCKETS,
    })?;
    registry.register(FamilySpec {
        name: HTTP_REQUESTS_IN_FLIGHT,
        help: "Current number of requests being processed.",
        kind: MetricKind::Gauge,
        labels: &["route", "method"],
        buckets: &[],
    })?;
    registry.register(FamilySpec {
        name: HTTP_RESPONSE_SIZE_BYTES,
        help: "Size of HTTP responses in bytes.",
        kind: MetricKind::Histogram,
        labels: &["route", "method"],
        buckets: &SIZE_BUCKETS,
    })?;
    registry.register(FamilySpec {
        name: DEPENDENCY_DURATION_SECONDS,
        help: "Duration of outgoing requests to the peer service.",
        kind: MetricKind::Histogram,
        labels: &["target_service", "method"],
        buckets: &DEPENDENCY_BUCKETS,
    })?;
    Ok(())
}
