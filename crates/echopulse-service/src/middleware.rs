//! Instrumentation middleware.
//!
//! Wraps every route (including `/metrics`) and feeds the registry: request
//! totals by status, latency and response-size histograms, and an in-flight
//! gauge released by a drop guard on every exit path.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http_body::Body as _;

use echopulse_core::metrics::MetricsRegistry;

use crate::families::{
    HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
    HTTP_RESPONSE_SIZE_BYTES,
};

/// Label used when the transport has no route template for a request.
pub const UNKNOWN_ROUTE: &str = "unknown_route";

/// Resolve the route label for a request.
///
/// Only the matched route template is ever used as a label value; a raw
/// request path would blow up cardinality, so anything unmatched collapses
/// to [`UNKNOWN_ROUTE`].
pub fn route_label(matched: Option<&str>) -> &str {
    match matched {
        Some(p) if !p.is_empty() => p,
        _ => UNKNOWN_ROUTE,
    }
}

/// Decrements the in-flight gauge when dropped. The release is unconditional:
/// normal return, error response, or unwind all pass through here.
struct InFlightGuard {
    registry: Arc<MetricsRegistry>,
    route: String,
    method: String,
}

impl InFlightGuard {
    fn enter(registry: Arc<MetricsRegistry>, route: &str, method: &str) -> Self {
        registry.inc_gauge(HTTP_REQUESTS_IN_FLIGHT, &[route, method]);
        Self {
            registry,
            route: route.to_string(),
            method: method.to_string(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .dec_gauge(HTTP_REQUESTS_IN_FLIGHT, &[&self.route, &self.method]);
    }
}

/// Axum middleware; install with
/// `axum::middleware::from_fn_with_state(registry, track_http)`.
///
/// Handler failures reach this point already rendered by the transport's
/// failure-to-status path (`HttpError`), so the recorded status is exactly
/// what the caller receives.
pub async fn track_http(
    State(registry): State<Arc<MetricsRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let route =
        route_label(req.extensions().get::<MatchedPath>().map(|m| m.as_str())).to_string();
    let method = req.method().as_str().to_string();

    let start = Instant::now();
    let _in_flight = InFlightGuard::enter(Arc::clone(&registry), &route, &method);

    let res = next.run(req).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = res.status().as_u16().to_string();
    // Exact size is known for fixed bodies; streaming bodies count as 0.
    let body_size = res.body().size_hint().exact().unwrap_or(0);

    registry.inc(HTTP_REQUESTS_TOTAL, &[&route, &method, &status]);
    registry.observe(HTTP_REQUEST_DURATION_SECONDS, &[&route, &method], elapsed);
    registry.observe(
        HTTP_RESPONSE_SIZE_BYTES,
        &[&route, &method],
        body_size as f64,
    );

    res
}
