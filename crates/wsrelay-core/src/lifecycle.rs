//! Glue between transport connect/disconnect signals and the relay engine.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::channel::RelayChannel;
use crate::engine::RelayEngine;
use crate::errors::RelayError;
use crate::ids::Token;

/// Drives binding and disposal from consumer connection events.
#[derive(Clone)]
pub struct ChannelLifecycle {
    engine: Arc<RelayEngine>,
}

impl ChannelLifecycle {
    /// Wrap an engine handle.
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }

    /// The engine this adapter drives.
    pub fn engine(&self) -> &Arc<RelayEngine> {
        &self.engine
    }

    /// A consumer connected, optionally carrying a token.
    ///
    /// On success returns the bound token; the caller passes it back to
    /// [`disconnect`](Self::disconnect). On any failure the channel is
    /// closed before returning, so an unknown or lapsed token never keeps a
    /// live connection.
    pub async fn connect(
        &self,
        token: Option<&str>,
        channel: Arc<dyn RelayChannel>,
    ) -> Result<Token, RelayError> {
        let Some(raw) = token.filter(|t| !t.is_empty()) else {
            warn!("connect without token, closing channel");
            channel.close();
            return Err(RelayError::MissingToken);
        };

        let token = Token::from_raw(raw);
        match self.engine.bind_channel(&token, Arc::clone(&channel)).await {
            Ok(()) => Ok(token),
            Err(err) => {
                warn!(token = %token, error = %err, "rejecting channel");
                channel.close();
                Err(err)
            }
        }
    }

    /// A consumer disconnected.
    ///
    /// `bound` is the token returned by a successful [`connect`](Self::connect),
    /// or `None` when the connection never bound. Only bound connections
    /// dispose their token, so a rejected duplicate connection cannot tear
    /// down the session it collided with.
    pub async fn disconnect(&self, bound: Option<&Token>) {
        let Some(token) = bound else {
            debug!("disconnect of unbound connection");
            return;
        };
        let _ = self.engine.dispose(token).await;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bytes::Bytes;

    use super::*;
    use crate::config::RelayConfig;
    use crate::metrics::DisposeReason;
    use crate::testing::{CountingMetrics, RecordingChannel};

    fn lifecycle() -> (ChannelLifecycle, Arc<CountingMetrics>) {
        let metrics = CountingMetrics::new();
        let engine = Arc::new(RelayEngine::new(RelayConfig::default(), metrics.clone()));
        (ChannelLifecycle::new(engine), metrics)
    }

    #[tokio::test]
    async fn connect_without_token_closes_channel() {
        let (lc, _) = lifecycle();
        let chan = RecordingChannel::new();
        let err = lc.connect(None, chan.clone()).await.unwrap_err();
        assert_matches!(err, RelayError::MissingToken);
        assert_eq!(chan.close_calls(), 1);
    }

    #[tokio::test]
    async fn connect_with_empty_token_closes_channel() {
        let (lc, _) = lifecycle();
        let chan = RecordingChannel::new();
        let err = lc.connect(Some(""), chan.clone()).await.unwrap_err();
        assert_matches!(err, RelayError::MissingToken);
        assert_eq!(chan.close_calls(), 1);
    }

    #[tokio::test]
    async fn connect_with_unknown_token_closes_channel() {
        let (lc, _) = lifecycle();
        let chan = RecordingChannel::new();
        let err = lc.connect(Some("tok_bogus"), chan.clone()).await.unwrap_err();
        assert_matches!(err, RelayError::TokenNotFound { .. });
        assert_eq!(chan.close_calls(), 1);
    }

    #[tokio::test]
    async fn connect_binds_and_data_flows() {
        let (lc, _) = lifecycle();
        let token = lc.engine().issue_token().await;
        let chan = RecordingChannel::new();

        let bound = lc.connect(Some(token.as_str()), chan.clone()).await.unwrap();
        assert_eq!(bound, token);

        let _ = lc.engine().send_data(&token, &b"payload"[..]).await.unwrap();
        assert_eq!(chan.frames(), vec![Bytes::from_static(b"payload")]);
        assert_eq!(chan.close_calls(), 0);
    }

    #[tokio::test]
    async fn disconnect_disposes_bound_token() {
        let (lc, metrics) = lifecycle();
        let token = lc.engine().issue_token().await;
        let bound = lc
            .connect(Some(token.as_str()), RecordingChannel::new())
            .await
            .unwrap();

        lc.disconnect(Some(&bound)).await;
        assert!(!lc.engine().contains(&token).await);
        assert_eq!(metrics.disposed(DisposeReason::Disposed), 1);

        // second disconnect is harmless
        lc.disconnect(Some(&bound)).await;
        assert_eq!(metrics.disposed(DisposeReason::Disposed), 1);
    }

    #[tokio::test]
    async fn rejected_duplicate_does_not_dispose_session() {
        let (lc, _) = lifecycle();
        let token = lc.engine().issue_token().await;
        let first = RecordingChannel::new();
        let _ = lc.connect(Some(token.as_str()), first.clone()).await.unwrap();

        let dup = RecordingChannel::new();
        let err = lc.connect(Some(token.as_str()), dup.clone()).await.unwrap_err();
        assert_matches!(err, RelayError::AlreadyBound { .. });
        lc.disconnect(None).await;

        assert!(lc.engine().is_bound(&token).await);
        assert_eq!(first.close_calls(), 0);
        assert_eq!(dup.close_calls(), 1);
    }
}
