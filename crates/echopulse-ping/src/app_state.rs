//! Shared application state for the ping service.

use std::sync::Arc;
use std::time::Duration;

use echopulse_core::metrics::MetricsRegistry;
use echopulse_core::Result;
use echopulse_service::client::PeerClient;
use echopulse_service::config::ServiceConfig;
use echopulse_service::families::register_http_families;

use crate::traffic::{self, TrafficGenerator};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricsRegistry>,
    traffic: Arc<TrafficGenerator>,
}

impl AppState {
    /// Build application state with the production session timing.
    ///
    /// Registration failures are startup-fatal: the process must not serve
    /// traffic with an inconsistent metrics schema.
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        Self::with_timing(cfg, traffic::DEFAULT_WINDOW, traffic::DEFAULT_CADENCE)
    }

    /// Same as [`AppState::new`] with an explicit session window and
    /// cadence. Integration tests compress time through this.
    pub fn with_timing(cfg: &ServiceConfig, window: Duration, cadence: Duration) -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        register_http_families(&registry)?;
        traffic::register_traffic_families(&registry)?;

        let client = Arc::new(PeerClient::new(Arc::clone(&registry))?);
        let traffic = Arc::new(TrafficGenerator::new(
            client,
            Arc::clone(&registry),
            cfg.peer_url.clone(),
            window,
            cadence,
        ));

        Ok(Self { registry, traffic })
    }

    pub fn registry(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn traffic(&self) -> &TrafficGenerator {
        &self.traffic
    }
}
