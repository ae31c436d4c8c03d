//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wsrelay_core::RelayConfig;

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8080`; `0` auto-assigns).
    pub port: u16,
    /// Token lifetime in seconds before it may expire.
    pub token_ttl_secs: u64,
    /// Bytes read from a request body per relayed frame.
    pub chunk_size: usize,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
    /// Seconds a single frame write may wait on a slow consumer.
    pub write_timeout_secs: u64,
    /// Seconds a send may wait for the next piece of its request body.
    pub read_timeout_secs: u64,
    /// Outbound frames buffered per consumer before writers wait.
    pub send_queue_capacity: usize,
    /// Seconds between server pings.
    pub ping_interval_secs: u64,
    /// Seconds without any frame from the consumer before it is dropped.
    pub pong_timeout_secs: u64,
    /// Max inbound `WebSocket` message size in bytes.
    pub max_message_size: usize,
    /// Seconds to wait for sessions and the listener to finish on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let relay = RelayConfig::default();
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            token_ttl_secs: relay.token_ttl.as_secs(),
            chunk_size: relay.chunk_size,
            sweep_interval_secs: relay.sweep_interval.as_secs(),
            write_timeout_secs: 30,
            read_timeout_secs: relay.read_timeout.as_secs(),
            send_queue_capacity: 64,
            ping_interval_secs: 30,
            pong_timeout_secs: 60,
            max_message_size: 64 * 1024,
            shutdown_grace_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Engine settings derived from this config.
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            token_ttl: Duration::from_secs(self.token_ttl_secs),
            chunk_size: self.chunk_size.max(1),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            read_timeout: Duration::from_secs(self.read_timeout_secs.max(1)),
        }
    }

    /// Per-frame write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs.max(1))
    }

    /// Ping cadence.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    /// How long a consumer may stay silent, pongs included.
    ///
    /// Never shorter than one ping interval, so a healthy consumer always
    /// gets a ping to answer.
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs.max(self.ping_interval_secs).max(1))
    }

    /// Shutdown grace period. Zero is allowed and means "don't wait".
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_relay_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.token_ttl_secs, 15 * 60);
        assert_eq!(cfg.chunk_size, 4096);
        assert_eq!(cfg.relay_config(), RelayConfig::default());
        assert_eq!(cfg.shutdown_grace(), Duration::from_secs(10));
        assert_eq!(cfg.pong_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.relay_config().read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_values_are_clamped() {
        let cfg = ServerConfig {
            chunk_size: 0,
            sweep_interval_secs: 0,
            write_timeout_secs: 0,
            ping_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.relay_config().chunk_size, 1);
        assert_eq!(cfg.relay_config().sweep_interval, Duration::from_secs(1));
        assert_eq!(cfg.write_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.ping_interval(), Duration::from_secs(1));
    }

    #[test]
    fn pong_timeout_covers_a_ping_interval() {
        let cfg = ServerConfig {
            ping_interval_secs: 20,
            pong_timeout_secs: 5,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.pong_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn deserialize_partial_json_fills_defaults() {
        let json = r#"{"port":3000,"token_ttl_secs":60}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.relay_config().token_ttl, Duration::from_secs(60));
        assert_eq!(cfg.chunk_size, 4096);
        assert_eq!(cfg.send_queue_capacity, 64);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.write_timeout_secs, cfg.write_timeout_secs);
        assert_eq!(back.max_message_size, cfg.max_message_size);
    }
}
