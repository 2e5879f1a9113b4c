//! Axum router wiring for the ping service.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use echopulse_service::middleware::track_http;

use crate::{app_state::AppState, handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/start", get(handlers::start))
        .route("/callback", post(handlers::callback))
        .route("/metrics", get(handlers::metrics))
        .route("/healthz", get(handlers::healthz))
        .layer(from_fn_with_state(state.registry(), track_http))
        .with_state(state)
}
