//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` while serving, `"draining"` once shutdown has started.
    pub status: &'static str,
    /// Whole seconds since the server started.
    pub uptime_secs: u64,
    /// Tokens held by the relay, bound or not, including lapsed ones not yet swept.
    pub tokens: usize,
}

/// Snapshot the relay's health.
pub fn health_check(start_time: Instant, tokens: usize, draining: bool) -> HealthResponse {
    HealthResponse {
        status: if draining { "draining" } else { "ok" },
        uptime_secs: start_time.elapsed().as_secs(),
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serving_reports_ok() {
        let resp = health_check(Instant::now(), 0, false);
        assert_eq!(resp.status, "ok");
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn draining_is_reported() {
        assert_eq!(health_check(Instant::now(), 2, true).status, "draining");
    }

    #[test]
    fn body_shape() {
        let json = serde_json::to_value(health_check(Instant::now(), 3, false)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["tokens"], 3);
        assert!(json["uptime_secs"].is_u64());
    }
}
