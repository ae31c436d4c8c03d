//! `RelayServer`: Axum HTTP + `WebSocket` server.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wsrelay_core::{ChannelLifecycle, RelayEngine, RelayMetrics};

use crate::config::ServerConfig;
use crate::http;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::SessionSettings;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay engine holding the binding table.
    pub engine: Arc<RelayEngine>,
    /// Connect/disconnect adapter for consumer sockets.
    pub lifecycle: ChannelLifecycle,
    /// Settings handed to every consumer session.
    pub session: SessionSettings,
    /// Max inbound `WebSocket` message size.
    pub max_message_size: usize,
    /// Tracks consumer sessions so shutdown can wait for them.
    pub tasks: TaskTracker,
    /// Renders `/metrics`.
    pub metrics_handle: PrometheusHandle,
    /// When the server started.
    pub start_time: Instant,
}

/// The relay server.
pub struct RelayServer {
    config: ServerConfig,
    engine: Arc<RelayEngine>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics_handle: PrometheusHandle,
    start_time: Instant,
}

impl RelayServer {
    /// Create a new server.
    ///
    /// `metrics` receives relay events; `metrics_handle` renders whatever
    /// recorder backs the `metrics` facade.
    pub fn new(
        config: ServerConfig,
        metrics: Arc<dyn RelayMetrics>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let engine = Arc::new(RelayEngine::new(config.relay_config(), metrics));
        let shutdown = Arc::new(ShutdownCoordinator::new(config.shutdown_grace()));
        Self {
            config,
            engine,
            shutdown,
            metrics_handle,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            lifecycle: ChannelLifecycle::new(self.engine.clone()),
            session: SessionSettings {
                send_queue_capacity: self.config.send_queue_capacity,
                write_timeout: self.config.write_timeout(),
                ping_interval: self.config.ping_interval(),
                pong_timeout: self.config.pong_timeout(),
                shutdown: self.shutdown.signal(),
            },
            max_message_size: self.config.max_message_size,
            tasks: self.shutdown.tracker(),
            metrics_handle: self.metrics_handle.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/session", post(http::issue_session))
            .route("/session/receive/{token}", get(http::receive_session))
            .route("/session/send/{token}", post(http::send_to_session))
            .route("/metrics", get(http::metrics_handler))
            .route("/health", get(http::health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the listener and serve until shutdown.
    ///
    /// Also starts the expiry sweeper. Both tasks are tracked by the shutdown
    /// coordinator; the returned handle finishes once shutdown fires and
    /// in-flight requests complete.
    pub async fn listen(&self) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let cancel = self.shutdown.signal();
        let sweeper = self.engine.spawn_sweeper(cancel.clone());

        info!(
            addr = %local_addr,
            token_ttl_secs = self.config.token_ttl_secs,
            chunk_size = self.config.chunk_size,
            "relay server started"
        );

        let handle = self.shutdown.spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await;
            if let Err(e) = served {
                error!(error = %e, "server exited with error");
            }
            let _ = sweeper.await;
            info!("relay server stopped");
        });

        Ok((local_addr, handle))
    }

    /// Get the relay engine.
    pub fn engine(&self) -> &Arc<RelayEngine> {
        &self.engine
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
