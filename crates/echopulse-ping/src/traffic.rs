//! Timed traffic generation toward the pong service.
//!
//! A session is a detached loop that posts to the peer on a fixed cadence
//! until its window elapses. Expiry is the only termination signal; there is
//! no external cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use echopulse_core::metrics::{FamilySpec, MetricKind, MetricsRegistry};
use echopulse_core::Result;
use echopulse_service::client::PeerClient;

/// Ping-side family registered on top of the shared HTTP set.
pub const TRAFFIC_SESSIONS_ACTIVE: &str = "traffic_sessions_active";

/// Peer name used for dependency attribution.
const TARGET_SERVICE: &str = "pong";

/// Default session window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);
/// Default tick cadence.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

/// Register the ping-side session gauge.
pub fn register_traffic_families(registry: &MetricsRegistry) -> Result<()> {
    registry.register(FamilySpec {
        name: TRAFFIC_SESSIONS_ACTIVE,
        help: "Number of traffic sessions currently running.",
        kind: MetricKind::Gauge,
        labels: &[],
        buckets: &[],
    })
}

/// Spawns bounded-duration ping loops toward the peer.
///
/// `start` may be invoked repeatedly; overlapping sessions are allowed and
/// each runs to its own expiry.
pub struct TrafficGenerator {
    client: Arc<PeerClient>,
    registry: Arc<MetricsRegistry>,
    target_url: String,
    window: Duration,
    cadence: Duration,
}

/// Handle to a running session; reports liveness only. The loop itself is
/// fire-and-forget.
#[derive(Clone)]
pub struct SessionHandle {
    live: Arc<AtomicBool>,
}

impl SessionHandle {
    /// True until the session's window elapses.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// One bounded run of the traffic loop.
struct TrafficSession {
    started_at: Instant,
    window: Duration,
    cadence: Duration,
    target_url: String,
    live: Arc<AtomicBool>,
}

impl TrafficGenerator {
    pub fn new(
        client: Arc<PeerClient>,
        registry: Arc<MetricsRegistry>,
        target_url: String,
        window: Duration,
        cadence: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            target_url,
            window,
            cadence,
        }
    }

    /// Begin a session: spawn the detached loop and return immediately. The
    /// caller never blocks on, or learns the outcome of, the loop.
    pub fn start(&self) -> SessionHandle {
        let live = Arc::new(AtomicBool::new(true));
        let session = TrafficSession {
            started_at: Instant::now(),
            window: self.window,
            cadence: self.cadence,
            target_url: self.target_url.clone(),
            live: Arc::clone(&live),
        };

        self.registry.inc_gauge(TRAFFIC_SESSIONS_ACTIVE, &[]);
        tokio::spawn(session.run(Arc::clone(&self.client), Arc::clone(&self.registry)));

        SessionHandle { live }
    }
}

impl TrafficSession {
    /// Fixed-cadence loop, hard-stopped by the window deadline. The deadline
    /// arm is polled first so expiry wins even mid-tick-wait.
    async fn run(self, client: Arc<PeerClient>, registry: Arc<MetricsRegistry>) {
        tracing::info!(
            target_url = %self.target_url,
            window_secs = self.window.as_secs_f64(),
            "traffic session starting"
        );

        let deadline = tokio::time::sleep_until(self.started_at + self.window);
        tokio::pin!(deadline);

        // First attempt lands one cadence after start.
        let mut tick = interval_at(self.started_at + self.cadence, self.cadence);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts: u64 = 0;
        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => break,

                _ = tick.tick() => {
                    attempts += 1;
                    // One observation per attempt is recorded inside the
                    // client, success or failure; a failed attempt never
                    // ends the session.
                    if let Err(e) = client.post_empty_json(&self.target_url, TARGET_SERVICE).await {
                        tracing::warn!(error = %e, "ping attempt failed");
                    }
                }
            }
        }

        self.live.store(false, Ordering::Release);
        registry.dec_gauge(TRAFFIC_SESSIONS_ACTIVE, &[]);
        tracing::info!(attempts, "traffic session finished");
    }
}
