//! Outbound peer client.
//!
//! One `reqwest` client per service, shared by every detached task. Each
//! attempt records exactly one dependency-duration observation, success or
//! failure, attributed to the peer it targets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use echopulse_core::metrics::MetricsRegistry;
use echopulse_core::{EchoPulseError, Result};

use crate::families::DEPENDENCY_DURATION_SECONDS;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PeerClient {
    http: reqwest::Client,
    registry: Arc<MetricsRegistry>,
}

impl PeerClient {
    /// Build the shared client. The timeouts bound how long a
    /// fire-and-forget task can hold a connection.
    pub fn new(registry: Arc<MetricsRegistry>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EchoPulseError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { http, registry })
    }

    /// POST an empty JSON body to `url`, observing the round-trip latency
    /// under `target_service` whether or not the call succeeds.
    pub async fn post_empty_json(
        &self,
        url: &str,
        target_service: &str,
    ) -> Result<reqwest::StatusCode> {
        let start = Instant::now();
        let res = self.http.post(url).json(&serde_json::json!({})).send().await;
        let elapsed = start.elapsed().as_secs_f64();

        self.registry.observe(
            DEPENDENCY_DURATION_SECONDS,
            &[target_service, "POST"],
            elapsed,
        );

        match res {
            Ok(r) => Ok(r.status()),
            Err(e) => Err(EchoPulseError::Upstream(e.to_string())),
        }
    }
}
