//! Shared application state for the pong service.

use std::sync::Arc;

use echopulse_core::metrics::MetricsRegistry;
use echopulse_core::Result;
use echopulse_service::client::PeerClient;
use echopulse_service::config::ServiceConfig;
use echopulse_service::families::register_http_families;

use crate::ack::AckResponder;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricsRegistry>,
    ack: Arc<AckResponder>,
}

impl AppState {
    /// Build application state. Registration failures are startup-fatal:
    /// the process must not serve traffic with an inconsistent schema.
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        register_http_families(&registry)?;

        let client = Arc::new(PeerClient::new(Arc::clone(&registry))?);
        let ack = Arc::new(AckResponder::new(client, cfg.peer_url.clone()));

        Ok(Self { registry, ack })
    }

    pub fn registry(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn ack(&self) -> &AckResponder {
        &self.ack
    }
}
