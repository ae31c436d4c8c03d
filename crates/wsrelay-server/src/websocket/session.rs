//! Consumer `WebSocket` session: one connection from upgrade to disconnect.

use std::time::{Duration, Instant};

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use wsrelay_core::{ChannelLifecycle, ConnectionId, RelayChannel, RelayError};

use super::channel::WsChannel;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_REJECTED_TOTAL,
    WS_UNRESPONSIVE_TOTAL,
};

/// How long the outbound task gets to flush and send a close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Per-connection settings shared by every session.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Outbound frames buffered before relay writes wait.
    pub send_queue_capacity: usize,
    /// Longest a single relay write may wait.
    pub write_timeout: Duration,
    /// Interval between server-initiated pings.
    pub ping_interval: Duration,
    /// Longest the consumer may send nothing, pongs included, before it is dropped.
    pub pong_timeout: Duration,
    /// Fires on server shutdown.
    pub shutdown: CancellationToken,
}

/// Close code sent when a connection is refused at bind time.
fn reject_code(err: &RelayError) -> u16 {
    match err {
        RelayError::MissingToken => close_code::PROTOCOL,
        _ => close_code::POLICY,
    }
}

/// Run a consumer session for `token`.
///
/// 1. Binds a [`WsChannel`] to the token; refuses the connection on failure
/// 2. Forwards relayed chunks as binary frames and sends periodic pings
/// 3. Ignores data frames from the consumer; the relay is one-directional,
///    but any inbound frame counts as a sign of life
/// 4. Drops a consumer silent for longer than `pong_timeout`
/// 5. On close, error, silence, writer failure, or shutdown: closes the
///    channel, then disposes the token
#[instrument(skip_all, fields(connection_id = %connection_id, token = %token))]
pub async fn run_relay_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    token: String,
    lifecycle: ChannelLifecycle,
    settings: SessionSettings,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (channel, mut frames) = WsChannel::new(
        connection_id,
        settings.send_queue_capacity,
        settings.write_timeout,
    );
    let closed = channel.close_signal();

    let bound = match lifecycle.connect(Some(&token), channel.clone()).await {
        Ok(bound) => bound,
        Err(err) => {
            counter!(WS_REJECTED_TOTAL, "reason" => err.error_kind()).increment(1);
            let frame = CloseFrame {
                code: reject_code(&err),
                reason: Utf8Bytes::from_static(err.error_kind()),
            };
            let _ = ws_tx.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    let started = Instant::now();
    info!("consumer connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let outbound_closed = closed.clone();
    let ping_interval = settings.ping_interval;
    let mut outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                biased;

                frame = frames.recv() => {
                    let Some(frame) = frame else { break };
                    trace!(len = frame.len(), "forwarding frame");
                    if ws_tx.send(Message::Binary(frame)).await.is_err() {
                        break;
                    }
                }
                () = outbound_closed.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        // Dropping `frames` here makes the channel report closed.
    });

    let pong_timeout = settings.pong_timeout;
    let mut last_heard = tokio::time::Instant::now();
    let mut liveness = tokio::time::interval(settings.ping_interval);
    let _ = liveness.tick().await;
    let mut outbound_done = false;

    loop {
        tokio::select! {
            () = closed.cancelled() => {
                debug!("channel closed by relay");
                break;
            }
            () = settings.shutdown.cancelled() => {
                debug!("server shutting down");
                break;
            }
            _ = &mut outbound => {
                debug!("outbound writer stopped");
                outbound_done = true;
                break;
            }
            _ = liveness.tick() => {
                if last_heard.elapsed() > pong_timeout {
                    warn!(?pong_timeout, "consumer unresponsive, disconnecting");
                    counter!(WS_UNRESPONSIVE_TOTAL).increment(1);
                    break;
                }
            }
            msg = ws_rx.next() => {
                if matches!(msg, Some(Ok(_))) {
                    last_heard = tokio::time::Instant::now();
                }
                match msg {
                    None | Some(Ok(Message::Close(_))) => {
                        debug!("consumer closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket receive error");
                        break;
                    }
                    Some(Ok(Message::Binary(_) | Message::Text(_))) => {
                        trace!("ignoring inbound data frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                }
            }
        }
    }

    // Writers fail fast from here on, so in-flight sends release the table lock.
    channel.close();
    if !outbound_done && tokio::time::timeout(CLOSE_GRACE, &mut outbound).await.is_err() {
        outbound.abort();
        let _ = outbound.await;
    }
    lifecycle.disconnect(Some(&bound)).await;

    info!("consumer disconnected");
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
}
