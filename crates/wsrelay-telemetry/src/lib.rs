//! # wsrelay-telemetry
//!
//! - [`init_subscriber`]: `tracing` subscriber with a development and a production profile
//! - [`prometheus`]: recorder setup and text rendering for the `/metrics` endpoint

#![deny(unsafe_code)]

pub mod logging;
pub mod prometheus;

pub use logging::{LogProfile, init_subscriber};
