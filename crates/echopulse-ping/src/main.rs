//! echopulse ping service.
//!
//! - `GET /start`    : begin a bounded traffic session toward pong
//! - `POST /callback`: acknowledgment target for pong's callback
//! - `GET /metrics`  : Prometheus text exposition
//! - `GET /healthz`  : liveness

use tracing_subscriber::{fmt, EnvFilter};

use echopulse_ping::{app_state, router};
use echopulse_service::config::ServiceConfig;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = ServiceConfig::from_env(
        "PORT",
        "127.0.0.1:8080",
        "PONG_SERVICE_URL",
        "http://localhost:8081/receive-ping",
    )
    .expect("config load failed");

    let state = app_state::AppState::new(&cfg).expect("state init failed");
    let app = router::build_router(state);

    tracing::info!(listen = %cfg.listen, "echopulse-ping starting");
    let listener = tokio::net::TcpListener::bind(cfg.listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
