//! Relay engine tuning.

use std::time::Duration;

/// Default lifetime of an issued token before it becomes eligible for expiry.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Default size of each chunk forwarded to a channel.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Default cadence of the background expiry sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default longest wait for the next piece of a request body.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`RelayEngine`](crate::engine::RelayEngine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// Time-to-live applied to every binding on insert.
    pub token_ttl: Duration,
    /// Maximum bytes read from a body before each channel write.
    pub chunk_size: usize,
    /// Interval between expiry sweeps.
    pub sweep_interval: Duration,
    /// Longest a send waits on its body between reads.
    pub read_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}
