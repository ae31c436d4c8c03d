//! Transport-level metric names.
//!
//! Relay metrics (tokens, bytes, frames) live in `wsrelay_core::metrics`.

/// Consumer `WebSocket` connections accepted (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "wsrelay_ws_connections_total";
/// Consumer connections rejected at bind time (counter, labels: reason).
pub const WS_REJECTED_TOTAL: &str = "wsrelay_ws_rejected_total";
/// Open consumer connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "wsrelay_ws_connections_active";
/// Consumers dropped for going silent past the pong timeout (counter).
pub const WS_UNRESPONSIVE_TOTAL: &str = "wsrelay_ws_unresponsive_total";
/// Consumer connection lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "wsrelay_ws_connection_duration_seconds";
/// Relay errors surfaced over HTTP (counter, labels: kind).
pub const HTTP_RELAY_ERRORS_TOTAL: &str = "wsrelay_http_relay_errors_total";
