//! # wsrelay
//!
//! Relay server binary: parses configuration, installs logging and the
//! Prometheus recorder, and serves until ctrl-c.

#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use wsrelay_core::FacadeMetrics;
use wsrelay_server::config::ServerConfig;
use wsrelay_server::server::RelayServer;
use wsrelay_telemetry::{LogProfile, init_subscriber};

/// Token-bound HTTP to `WebSocket` byte relay.
#[derive(Parser, Debug)]
#[command(name = "wsrelay", about = "Token-bound HTTP to WebSocket byte relay")]
struct Cli {
    /// Host to bind.
    #[arg(long, env = "WSRELAY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, env = "WSRELAY_PORT", default_value_t = 8080)]
    port: u16,

    /// Seconds a token lives before it may be swept.
    #[arg(long, env = "WSRELAY_TOKEN_TTL_SECS", default_value_t = 900)]
    token_ttl_secs: u64,

    /// Bytes per relayed frame.
    #[arg(long, env = "WSRELAY_CHUNK_SIZE", default_value_t = 4096)]
    chunk_size: usize,

    /// Seconds between expiry sweeps.
    #[arg(long, env = "WSRELAY_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    sweep_interval_secs: u64,

    /// Seconds a frame write may wait on a slow consumer.
    #[arg(long, env = "WSRELAY_WRITE_TIMEOUT_SECS", default_value_t = 30)]
    write_timeout_secs: u64,

    /// Seconds a send may wait for the next piece of its request body.
    #[arg(long, env = "WSRELAY_READ_TIMEOUT_SECS", default_value_t = 30)]
    read_timeout_secs: u64,

    /// Frames buffered per consumer before writers wait.
    #[arg(long, env = "WSRELAY_SEND_QUEUE_CAPACITY", default_value_t = 64)]
    send_queue_capacity: usize,

    /// Seconds between server pings.
    #[arg(long, env = "WSRELAY_PING_INTERVAL_SECS", default_value_t = 30)]
    ping_interval_secs: u64,

    /// Seconds a consumer may stay silent before it is dropped.
    #[arg(long, env = "WSRELAY_PONG_TIMEOUT_SECS", default_value_t = 60)]
    pong_timeout_secs: u64,

    /// Seconds to wait for open sessions on shutdown.
    #[arg(long, env = "WSRELAY_SHUTDOWN_GRACE_SECS", default_value_t = 10)]
    shutdown_grace_secs: u64,

    /// `development` for verbose human-readable logs; anything else logs JSON.
    #[arg(long, env = "APP_ENV")]
    app_env: Option<String>,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            token_ttl_secs: self.token_ttl_secs,
            chunk_size: self.chunk_size,
            sweep_interval_secs: self.sweep_interval_secs,
            write_timeout_secs: self.write_timeout_secs,
            read_timeout_secs: self.read_timeout_secs,
            send_queue_capacity: self.send_queue_capacity,
            ping_interval_secs: self.ping_interval_secs,
            pong_timeout_secs: self.pong_timeout_secs,
            shutdown_grace_secs: self.shutdown_grace_secs,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let profile = LogProfile::from_app_env(cli.app_env.as_deref());
    let _ = init_subscriber(profile);

    let metrics_handle = wsrelay_telemetry::prometheus::install_recorder()
        .context("Failed to install metrics recorder")?;

    let server = RelayServer::new(cli.server_config(), Arc::new(FacadeMetrics), metrics_handle);
    let (addr, _handle) = server
        .listen()
        .await
        .context("Failed to bind server")?;

    tracing::info!(?profile, "wsrelay listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    if !server.shutdown().drain().await {
        tracing::warn!("exiting with sessions still open");
    }
    Ok(())
}
