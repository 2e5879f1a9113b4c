//! HTTP handlers for the ping service.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use echopulse_service::families::EXPOSITION_CONTENT_TYPE;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct Ack {
    status: &'static str,
}

/// `GET /start`: spawn a traffic session and return immediately; the
/// response never waits on the loop.
pub async fn start(State(app): State<AppState>) -> &'static str {
    app.traffic().start();
    "traffic session starting"
}

/// `POST /callback`: acknowledgment target for the pong service. Only
/// acknowledges receipt; no further outbound action.
pub async fn callback() -> Json<Ack> {
    tracing::info!("callback received from pong");
    Json(Ack { status: "ack" })
}

/// `GET /metrics`: text exposition scrape.
pub async fn metrics(State(app): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        app.registry().render(),
    )
}

/// `GET /healthz`: liveness.
pub async fn healthz() -> &'static str {
    "ok"
}
