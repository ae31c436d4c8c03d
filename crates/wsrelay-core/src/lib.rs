//! # wsrelay-core
//!
//! Token/session relay engine, independent of HTTP and WebSocket framing.
//!
//! - [`Token`] issuance and the token → channel binding table
//! - [`ExpiringTable`]: uniform TTL with a liveness veto evaluated at sweep time
//! - [`RelayEngine`]: bind, dispose, and chunked streaming send under one lock
//! - [`ChannelLifecycle`]: connect/disconnect glue for the transport layer
//! - [`RelayMetrics`]: instrumentation sink, backed by the `metrics` facade

#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ids;
pub mod lifecycle;
pub mod metrics;
pub mod record;
pub mod table;

#[cfg(test)]
mod testing;

pub use channel::RelayChannel;
pub use config::RelayConfig;
pub use engine::{RelayEngine, SendSummary};
pub use errors::{ChannelError, RelayError};
pub use ids::{ConnectionId, Token};
pub use lifecycle::ChannelLifecycle;
pub use crate::metrics::{DisposeReason, FacadeMetrics, NoopMetrics, RelayMetrics};
pub use record::BindingRecord;
pub use table::ExpiringTable;
