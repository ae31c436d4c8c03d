//! Relay engine: token issuance, channel binding, disposal, and the
//! streaming forward from an inbound body to a bound channel.
//!
//! # Locking
//!
//! One `tokio::sync::RwLock` guards the binding table. Issuance, binding,
//! disposal and the expiry sweep take it for writing; `send_data` holds it
//! for reading across the whole streaming loop. Sends therefore run
//! concurrently with each other, while a dispose or bind waits for every
//! in-flight send to finish. A dispose never interrupts a send that has
//! already started; sends that arrive after it see `TokenNotFound`.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::channel::RelayChannel;
use crate::config::RelayConfig;
use crate::errors::RelayError;
use crate::ids::Token;
use crate::metrics::{DisposeReason, RelayMetrics};
use crate::record::BindingRecord;
use crate::table::ExpiringTable;

/// Outcome of a successful [`RelayEngine::send_data`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SendSummary {
    /// Bytes written to the channel.
    pub bytes: u64,
    /// Frames written to the channel.
    pub messages: u64,
}

/// Owns the binding table and every record in it.
pub struct RelayEngine {
    table: RwLock<ExpiringTable<Token, BindingRecord>>,
    metrics: Arc<dyn RelayMetrics>,
    config: RelayConfig,
}

impl RelayEngine {
    /// Create an engine with an empty table.
    pub fn new(config: RelayConfig, metrics: Arc<dyn RelayMetrics>) -> Self {
        Self {
            table: RwLock::new(ExpiringTable::new(config.token_ttl)),
            metrics,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Mint a token and insert an unbound record for it.
    pub async fn issue_token(&self) -> Token {
        let token = Token::new();
        let _ = self
            .table
            .write()
            .await
            .put(token.clone(), BindingRecord::unbound(token.clone()));
        self.metrics.token_issued();
        info!(token = %token, "token issued");
        token
    }

    /// Attach a consumer channel to an issued token.
    ///
    /// Fails with `TokenNotFound` for unknown, disposed, or lapsed tokens and
    /// with `AlreadyBound` once any channel has been bound, open or not. A
    /// token carries at most one channel over its lifetime.
    pub async fn bind_channel(
        &self,
        token: &Token,
        channel: Arc<dyn RelayChannel>,
    ) -> Result<(), RelayError> {
        let mut table = self.table.write().await;

        if table
            .get_checked(token, Instant::now(), BindingRecord::is_live)
            .is_none()
        {
            if table.remove(token).is_some() {
                self.metrics.token_disposed(DisposeReason::Expired);
                info!(token = %token, "token lapsed before a channel bound");
            } else {
                warn!(token = %token, "bind for unknown token");
            }
            return Err(RelayError::TokenNotFound {
                token: token.clone(),
            });
        }

        let Some(record) = table.get_mut(token) else {
            return Err(RelayError::TokenNotFound {
                token: token.clone(),
            });
        };
        if record.is_bound() {
            warn!(token = %token, open = record.is_live(), "token already has a channel");
            return Err(RelayError::AlreadyBound {
                token: token.clone(),
            });
        }

        record.bind(channel);
        info!(token = %token, "channel bound");
        Ok(())
    }

    /// Remove a token unconditionally, closing its channel if still open.
    ///
    /// Returns whether a record was removed. Disposing an absent token is a
    /// no-op and records nothing.
    pub async fn dispose(&self, token: &Token) -> bool {
        let removed = self.table.write().await.remove(token);
        let Some(record) = removed else {
            debug!(token = %token, "dispose for absent token");
            return false;
        };

        if let Some(channel) = record.channel().filter(|c| c.is_open()) {
            channel.close();
        }
        self.metrics.token_disposed(DisposeReason::Disposed);
        info!(token = %token, "token disposed");
        true
    }

    /// Stream `body` to the channel bound to `token`.
    ///
    /// Reads at most `chunk_size` bytes at a time and writes each non-empty
    /// read as one frame, in order. The first read or write failure ends the
    /// call; nothing is retried. A body that yields nothing for
    /// `read_timeout` fails with a `TimedOut` read error, so a stalled
    /// producer cannot hold the table lock indefinitely.
    #[instrument(skip_all, fields(token = %token))]
    pub async fn send_data<R>(&self, token: &Token, mut body: R) -> Result<SendSummary, RelayError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let table = self.table.read().await;

        let Some(record) = table.get_checked(token, Instant::now(), BindingRecord::is_live) else {
            warn!("send for unknown token");
            return Err(RelayError::TokenNotFound {
                token: token.clone(),
            });
        };
        let Some(channel) = record.channel().filter(|c| c.is_open()) else {
            warn!("send before a consumer connected");
            return Err(RelayError::NoBoundChannel {
                token: token.clone(),
            });
        };

        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let mut summary = SendSummary::default();
        let read_timeout = self.config.read_timeout;
        debug!("starting send");

        loop {
            let Ok(read) = tokio::time::timeout(read_timeout, body.read(&mut buf)).await else {
                warn!(?read_timeout, "request body stalled");
                return Err(RelayError::Read {
                    token: token.clone(),
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no body data for {read_timeout:?}"),
                    ),
                });
            };
            let n = match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    error!(error = %source, "reading request body failed");
                    return Err(RelayError::Read {
                        token: token.clone(),
                        source,
                    });
                }
            };

            trace!(byte_count = n, "writing chunk");
            if let Err(source) = channel.write(Bytes::copy_from_slice(&buf[..n])).await {
                error!(error = %source, "writing to channel failed");
                return Err(RelayError::Write {
                    token: token.clone(),
                    source,
                });
            }
            self.metrics.chunk_forwarded(token, n);
            summary.bytes += n as u64;
            summary.messages += 1;
        }

        debug!(
            bytes = summary.bytes,
            messages = summary.messages,
            "finished send"
        );
        Ok(summary)
    }

    /// Evict every lapsed token whose channel is not open.
    ///
    /// Returns how many tokens were evicted.
    pub async fn sweep_expired(&self) -> usize {
        let evicted = self
            .table
            .write()
            .await
            .sweep(Instant::now(), |_, record| record.is_live());

        for (token, record) in &evicted {
            self.metrics.token_disposed(DisposeReason::Expired);
            info!(
                token = %token,
                bound = record.is_bound(),
                age_secs = record.age().as_secs(),
                "token expired"
            );
        }
        evicted.len()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `sweep_interval`
    /// until `cancel` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let period = self.config.sweep_interval.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // consume the immediate first tick
            let _ = ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = engine.sweep_expired().await;
                        if removed > 0 {
                            debug!(removed, "expiry sweep");
                        }
                    }
                }
            }
            debug!("expiry sweeper stopped");
        })
    }

    /// Number of tokens in the table, including lapsed ones not yet swept.
    pub async fn token_count(&self) -> usize {
        self.table.read().await.len()
    }

    /// Whether `token` is currently in the table.
    pub async fn contains(&self, token: &Token) -> bool {
        self.table.read().await.contains_key(token)
    }

    /// Whether `token` has an open channel bound.
    pub async fn is_bound(&self, token: &Token) -> bool {
        self.table
            .read()
            .await
            .get(token)
            .is_some_and(BindingRecord::is_live)
    }
}
