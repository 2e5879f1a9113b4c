//! HTTP handlers for the pong service.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use echopulse_service::families::EXPOSITION_CONTENT_TYPE;

use crate::app_state::AppState;

/// `POST /receive-ping`: acknowledge immediately, then call back out of
/// band. The acknowledgment never waits on the callback.
pub async fn receive_ping(State(app): State<AppState>) -> &'static str {
    tracing::info!("ping received");
    app.ack().spawn_callback();
    "Pong"
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
