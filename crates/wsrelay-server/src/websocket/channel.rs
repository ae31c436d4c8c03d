//! [`RelayChannel`] backed by a consumer `WebSocket`.
//!
//! Writers enqueue frames on a bounded queue drained by the session's
//! outbound task. A full queue makes `write` wait, up to the configured
//! timeout, which is how a slow consumer pushes back on producers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wsrelay_core::{ChannelError, ConnectionId, RelayChannel};

/// Write half of a consumer connection, as handed to the relay engine.
pub struct WsChannel {
    id: ConnectionId,
    tx: mpsc::Sender<Bytes>,
    closed: CancellationToken,
    write_timeout: Duration,
}

impl WsChannel {
    /// Create a channel and the receiver its outbound task drains.
    pub fn new(
        id: ConnectionId,
        capacity: usize,
        write_timeout: Duration,
    ) -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Arc::new(Self {
            id,
            tx,
            closed: CancellationToken::new(),
            write_timeout,
        });
        (channel, rx)
    }

    /// Connection this channel writes to.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Token cancelled once the channel is closed from either side.
    pub fn close_signal(&self) -> CancellationToken {
        self.closed.clone()
    }
}

#[async_trait]
impl RelayChannel for WsChannel {
    async fn write(&self, chunk: Bytes) -> Result<(), ChannelError> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        tokio::select! {
            () = self.closed.cancelled() => Err(ChannelError::Closed),
            sent = tokio::time::timeout(self.write_timeout, self.tx.send(chunk)) => match sent {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) => Err(ChannelError::Closed),
                Err(_) => Err(ChannelError::TimedOut(self.write_timeout)),
            },
        }
    }

    fn is_open(&self) -> bool {
        !self.closed.is_cancelled() && !self.tx.is_closed()
    }

    fn close(&self) {
        self.closed.cancel();
    }
}
