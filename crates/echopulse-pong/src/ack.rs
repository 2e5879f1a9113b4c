//! Acknowledgment responder.
//!
//! Inbound pings are acknowledged synchronously by the handler; the callback
//! to the peer runs as a detached task whose outcome is observed only
//! through metrics and logs. No retry, no propagation.

use std::sync::Arc;

use echopulse_service::client::PeerClient;

/// Peer name used for dependency attribution.
const TARGET_SERVICE: &str = "ping";

pub struct AckResponder {
    client: Arc<PeerClient>,
    callback_url: String,
}

impl AckResponder {
    pub fn new(client: Arc<PeerClient>, callback_url: String) -> Self {
        Self {
            client,
            callback_url,
        }
    }

    /// Fire the callback toward the peer and return immediately.
    pub fn spawn_callback(&self) {
        let client = Arc::clone(&self.client);
        let url = self.callback_url.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post_empty_json(&url, TARGET_SERVICE).await {
                tracing::warn!(error = %e, "ack callback failed");
            }
        });
    }
}
