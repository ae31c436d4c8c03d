//! Instrumentation sink for relay lifecycle and traffic.
//!
//! The engine reports through the [`RelayMetrics`] trait. [`FacadeMetrics`]
//! forwards to the global `metrics` recorder, which the binary backs with a
//! Prometheus exporter; tests plug in an in-memory sink instead.

use metrics::{counter, gauge, histogram};

use crate::ids::Token;

// Metric name constants shared with the exporter setup.

/// Tokens issued (counter).
pub const TOKENS_ISSUED_TOTAL: &str = "wsrelay_token_total";
/// Tokens removed from the table (counter, labels: reason).
pub const TOKENS_DISPOSED_TOTAL: &str = "wsrelay_token_disposed_total";
/// Tokens currently in the table (gauge).
pub const TOKENS_ACTIVE: &str = "wsrelay_tokens_active";
/// Size of each forwarded chunk in bytes (histogram).
pub const MESSAGE_SIZE_BYTES: &str = "wsrelay_message_size_bytes";
/// Bytes forwarded per token (counter, labels: token).
pub const TOKEN_BYTES_TOTAL: &str = "wsrelay_token_bytes_total";
/// Frames forwarded per token (counter, labels: token).
pub const TOKEN_MESSAGES_TOTAL: &str = "wsrelay_token_messages_total";

/// Why a token left the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisposeReason {
    /// Explicit disposal (consumer disconnect or error path).
    Disposed,
    /// Evicted by the expiry sweep.
    Expired,
}

impl DisposeReason {
    /// Label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disposed => "disposed",
            Self::Expired => "expired",
        }
    }
}

/// Side-effect counters and histograms the relay engine reports into.
pub trait RelayMetrics: Send + Sync {
    /// A token was minted.
    fn token_issued(&self);

    /// A token left the table. Called exactly once per removed token.
    fn token_disposed(&self, reason: DisposeReason);

    /// One chunk of `bytes` was written to the channel bound to `token`.
    fn chunk_forwarded(&self, token: &Token, bytes: usize);
}

/// Reports through the global `metrics` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacadeMetrics;

impl RelayMetrics for FacadeMetrics {
    fn token_issued(&self) {
        counter!(TOKENS_ISSUED_TOTAL).increment(1);
        gauge!(TOKENS_ACTIVE).increment(1.0);
    }

    fn token_disposed(&self, reason: DisposeReason) {
        counter!(TOKENS_DISPOSED_TOTAL, "reason" => reason.as_str()).increment(1);
        gauge!(TOKENS_ACTIVE).decrement(1.0);
    }

    fn chunk_forwarded(&self, token: &Token, bytes: usize) {
        histogram!(MESSAGE_SIZE_BYTES).record(bytes as f64);
        counter!(TOKEN_BYTES_TOTAL, "token" => token.to_string()).increment(bytes as u64);
        counter!(TOKEN_MESSAGES_TOTAL, "token" => token.to_string()).increment(1);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl RelayMetrics for NoopMetrics {
    fn token_issued(&self) {}
    fn token_disposed(&self, _reason: DisposeReason) {}
    fn chunk_forwarded(&self, _token: &Token, _bytes: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            TOKENS_ISSUED_TOTAL,
            TOKENS_DISPOSED_TOTAL,
            TOKENS_ACTIVE,
            MESSAGE_SIZE_BYTES,
            TOKEN_BYTES_TOTAL,
            TOKEN_MESSAGES_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
            assert!(name.starts_with("wsrelay_"));
        }
    }

    #[test]
    fn facade_without_recorder_is_noop() {
        let sink = FacadeMetrics;
        sink.token_issued();
        sink.chunk_forwarded(&Token::from_raw("tok_a"), 5);
        sink.token_disposed(DisposeReason::Expired);
    }

    #[test]
    fn reason_labels() {
        assert_eq!(DisposeReason::Disposed.as_str(), "disposed");
        assert_eq!(DisposeReason::Expired.as_str(), "expired");
    }
}
