//! Ping service HTTP surface tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::post;
use axum::Router;

use echopulse_core::metrics::MetricsRegistry;
use echopulse_ping::traffic::TRAFFIC_SESSIONS_ACTIVE;
use echopulse_ping::{app_state::AppState, router};
use echopulse_service::config::ServiceConfig;
use echopulse_service::families::{EXPOSITION_CONTENT_TYPE, HTTP_REQUESTS_TOTAL};

async fn spawn_pong_stub() -> SocketAddr {
    let app = Router::new().route("/receive-ping", post(|| async { "Pong" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_ping(
    peer_url: String,
    window: Duration,
    cadence: Duration,
) -> (SocketAddr, Arc<MetricsRegistry>) {
    let cfg = ServiceConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        peer_url,
    };
    let state = AppState::with_timing(&cfg, window, cadence).unwrap();
    let registry = state.registry();
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(cfg.listen).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, registry)
}

#[tokio::test]
async fn start_returns_before_the_window_elapses() {
    let pong = spawn_pong_stub().await;
    let (addr, registry) = spawn_ping(
        format!("http://{pong}/receive-ping"),
        Duration::from_millis(300),
        Duration::from_millis(50),
    )
    .await;

    let t0 = Instant::now();
    let res = reqwest::get(format!("http://{addr}/start")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(
        t0.elapsed() < Duration::from_millis(200),
        "start must not block on the loop"
    );
    assert!(res.text().await.unwrap().contains("traffic session"));

    assert_eq!(registry.gauge_value(TRAFFIC_SESSIONS_ACTIVE, &[]), Some(1));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(registry.gauge_value(TRAFFIC_SESSIONS_ACTIVE, &[]), Some(0));
}

#[tokio::test]
async fn callback_acknowledges_with_fixed_json() {
    let (addr, registry) = spawn_ping(
        "http://127.0.0.1:9/receive-ping".to_string(),
        Duration::from_millis(100),
        Duration::from_millis(50),
    )
    .await;

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/callback"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ack");

    assert_eq!(
        registry.counter_value(HTTP_REQUESTS_TOTAL, &["/callback", "POST", "200"]),
        Some(1)
    );
}

#[tokio::test]
async fn metrics_endpoint_serves_the_exposition() {
    let (addr, _registry) = spawn_ping(
        "http://127.0.0.1:9/receive-ping".to_string(),
        Duration::from_millis(100),
        Duration::from_millis(50),
    )
    .await;

    // Generate one observation so a series exists.
    reqwest::get(format!("http://{addr}/healthz")).await.unwrap();

    let res = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap().to_str().unwrap(),
        EXPOSITION_CONTENT_TYPE
    );

    let body = res.text().await.unwrap();
    assert!(body.contains("# TYPE http_requests_total counter"));
    assert!(body.contains(r#"http_requests_total{route="/healthz",method="GET",status="200"} 1"#));
    assert!(body.contains("# TYPE traffic_sessions_active gauge"));
}
