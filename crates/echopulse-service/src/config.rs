//! Service config loader (env, read once at startup).

use std::net::SocketAddr;

use echopulse_core::{EchoPulseError, Result};

/// Runtime configuration for one service of the pair.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    pub peer_url: String,
}

impl ServiceConfig {
    /// Read the listen address and peer URL from the environment, falling
    /// back to the given defaults, and validate both. Invalid values are
    /// startup-fatal.
    pub fn from_env(
        listen_key: &str,
        default_listen: &str,
        peer_key: &str,
        default_peer: &str,
    ) -> Result<Self> {
        let listen_raw = env_or(listen_key, default_listen);
        let listen: SocketAddr = listen_raw.parse().map_err(|e| {
            EchoPulseError::Config(format!(
                "{listen_key}={listen_raw} is not a socket address: {e}"
            ))
        })?;

        let peer_url = env_or(peer_key, default_peer);
        reqwest::Url::parse(&peer_url).map_err(|e| {
            EchoPulseError::Config(format!("{peer_key}={peer_url} is not a valid URL: {e}"))
        })?;

        Ok(Self { listen, peer_url })
    }
}

/// Env lookup with fallback.
pub fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}
