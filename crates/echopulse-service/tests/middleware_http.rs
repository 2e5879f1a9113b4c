//! Instrumentation middleware end-to-end tests.
//!
//! Each test binds a real listener on an ephemeral port and drives it with
//! `reqwest`, so the middleware is exercised exactly as it is in production.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use echopulse_core::metrics::MetricsRegistry;
use echopulse_core::EchoPulseError;
use echopulse_service::error::HttpError;
use echopulse_service::families::{self, register_http_families};
use echopulse_service::middleware::{track_http, UNKNOWN_ROUTE};

async fn ok_handler() -> &'static str {
    tokio::time::sleep(Duration::from_millis(30)).await;
    "ok"
}

async fn bad_handler() -> Result<&'static str, HttpError> {
    Err(EchoPulseError::BadRequest("nope".into()).into())
}

async fn spawn_app(registry: Arc<MetricsRegistry>) -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(ok_handler))
        .route("/bad", get(bad_handler))
        .layer(from_fn_with_state(Arc::clone(&registry), track_http));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn new_registry() -> Arc<MetricsRegistry> {
    let registry = Arc::new(MetricsRegistry::new());
    register_http_families(&registry).unwrap();
    registry
}

#[tokio::test]
async fn in_flight_returns_to_zero_after_concurrent_requests() {
    let registry = new_registry();
    let addr = spawn_app(Arc::clone(&registry)).await;

    let client = reqwest::Client::new();
    let mut tasks = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        let path = if i % 4 == 0 { "bad" } else { "ok" };
        let url = format!("http://{addr}/{path}");
        tasks.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status()
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    assert_eq!(
        registry.gauge_value(families::HTTP_REQUESTS_IN_FLIGHT, &["/ok", "GET"]),
        Some(0)
    );
    assert_eq!(
        registry.gauge_value(families::HTTP_REQUESTS_IN_FLIGHT, &["/bad", "GET"]),
        Some(0)
    );

    // Totals across status values add up to the requests served.
    let ok = registry
        .counter_value(families::HTTP_REQUESTS_TOTAL, &["/ok", "GET", "200"])
        .unwrap_or(0);
    let bad = registry
        .counter_value(families::HTTP_REQUESTS_TOTAL, &["/bad", "GET", "400"])
        .unwrap_or(0);
    assert_eq!(bad, 2);
    assert_eq!(ok + bad, 8);
}

#[tokio::test]
async fn latency_and_size_observed_per_request() {
    let registry = new_registry();
    let addr = spawn_app(Arc::clone(&registry)).await;

    let client = reqwest::Client::new();
    for _ in 0..5 {
        let res = client
            .get(format!("http://{addr}/ok"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    assert_eq!(
        registry.histogram_count(families::HTTP_REQUEST_DURATION_SECONDS, &["/ok", "GET"]),
        Some(5)
    );
    // Handler sleeps 30ms per request.
    let dur_sum = registry
        .histogram_sum(families::HTTP_REQUEST_DURATION_SECONDS, &["/ok", "GET"])
        .unwrap();
    assert!(dur_sum >= 0.15, "latency sum too small: {dur_sum}");

    // Body is the 2-byte literal "ok".
    assert_eq!(
        registry.histogram_count(families::HTTP_RESPONSE_SIZE_BYTES, &["/ok", "GET"]),
        Some(5)
    );
    assert_eq!(
        registry.histogram_sum(families::HTTP_RESPONSE_SIZE_BYTES, &["/ok", "GET"]),
        Some(10.0)
    );
}

#[tokio::test]
async fn failure_status_matches_the_wire() {
    let registry = new_registry();
    let addr = spawn_app(Arc::clone(&registry)).await;

    let res = reqwest::get(format!("http://{addr}/bad")).await.unwrap();
    assert_eq!(res.status().as_u16(), 400);

    assert_eq!(
        registry.counter_value(families::HTTP_REQUESTS_TOTAL, &["/bad", "GET", "400"]),
        Some(1)
    );
}

#[tokio::test]
async fn unmatched_path_collapses_to_unknown_route() {
    let registry = new_registry();
    let addr = spawn_app(Arc::clone(&registry)).await;

    let res = reqwest::get(format!("http://{addr}/no/such/route/123"))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    assert_eq!(
        registry.counter_value(families::HTTP_REQUESTS_TOTAL, &[UNKNOWN_ROUTE, "GET", "404"]),
        Some(1)
    );
}

#[tokio::test]
async fn render_exposes_request_series() {
    let registry = new_registry();
    let addr = spawn_app(Arc::clone(&registry)).await;

    reqwest::get(format!("http://{addr}/ok")).await.unwrap();

    let out = registry.render();
    assert!(out.contains("# TYPE http_requests_total counter"));
    assert!(out.contains(r#"http_requests_total{route="/ok",method="GET",status="200"} 1"#));
    assert!(out.contains("# TYPE http_request_duration_seconds histogram"));
}
