//! HTTP error surface.
//!
//! `EchoPulseError` lives in the core crate; this wrapper resolves it into
//! the response the transport sends, so every handler failure goes through
//! one failure-to-status path and the status recorded by the middleware is
//! the status on the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use echopulse_core::EchoPulseError;

/// Handler-facing error: converts into a plain-text HTTP response.
#[derive(Debug)]
pub struct HttpError(pub EchoPulseError);

impl From<EchoPulseError> for HttpError {
    fn from(e: EchoPulseError) -> Self {
        Self(e)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.0.to_string()).into_response()
    }
}
