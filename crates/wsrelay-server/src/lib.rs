//! # wsrelay-server
//!
//! Axum HTTP + `WebSocket` front end for the relay engine.
//!
//! - `POST /session` issues a token
//! - `GET /session/receive/{token}` upgrades to a `WebSocket` bound to the token
//! - `POST /session/send/{token}` streams the request body to the bound socket
//! - `GET /metrics` and `GET /health`
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod http;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::{AppState, RelayServer};
