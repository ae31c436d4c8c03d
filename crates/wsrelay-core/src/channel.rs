//! The consumer-side duplex channel, as seen by the relay.
//!
//! The transport layer owns the real connection. The relay only holds an
//! `Arc<dyn RelayChannel>` handle that can write a frame, report whether
//! the connection is still open, and ask it to close.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::ChannelError;

/// Write handle to a bound consumer channel.
#[async_trait]
pub trait RelayChannel: Send + Sync {
    /// Deliver one chunk as one discrete binary frame.
    ///
    /// May wait while the consumer is slow; fails once the channel is
    /// closed or the transport gives up.
    async fn write(&self, chunk: Bytes) -> Result<(), ChannelError>;

    /// Whether the underlying connection is still open.
    fn is_open(&self) -> bool;

    /// Request the transport to close the connection. Idempotent.
    fn close(&self);
}
