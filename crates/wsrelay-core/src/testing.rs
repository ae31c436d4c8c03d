//! In-memory channel and metrics sink for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::channel::RelayChannel;
use crate::errors::ChannelError;
use crate::ids::Token;
use crate::metrics::{DisposeReason, RelayMetrics};

/// Channel that records every frame written to it.
#[derive(Default)]
pub struct RecordingChannel {
    frames: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frames(&self) -> Vec<Bytes> {
        self.frames.lock().clone()
    }

    pub fn concat(&self) -> Vec<u8> {
        self.frames.lock().iter().flat_map(|f| f.iter().copied()).collect()
    }

    /// Simulate the consumer going away without a close request.
    pub fn drop_connection(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayChannel for RecordingChannel {
    async fn write(&self, chunk: Bytes) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        self.frames.lock().push(chunk);
        tokio::task::yield_now().await;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        let _ = self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Sink that counts everything it is told.
#[derive(Default)]
pub struct CountingMetrics {
    issued: AtomicUsize,
    disposed: Mutex<HashMap<DisposeReason, usize>>,
    bytes: Mutex<HashMap<Token, usize>>,
    messages: Mutex<HashMap<Token, usize>>,
    sizes: Mutex<Vec<usize>>,
}

impl CountingMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn disposed(&self, reason: DisposeReason) -> usize {
        self.disposed.lock().get(&reason).copied().unwrap_or(0)
    }

    pub fn bytes_for(&self, token: &Token) -> usize {
        self.bytes.lock().get(token).copied().unwrap_or(0)
    }

    pub fn messages_for(&self, token: &Token) -> usize {
        self.messages.lock().get(token).copied().unwrap_or(0)
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.sizes.lock().clone()
    }
}

impl RelayMetrics for CountingMetrics {
    fn token_issued(&self) {
        let _ = self.issued.fetch_add(1, Ordering::SeqCst);
    }

    fn token_disposed(&self, reason: DisposeReason) {
        *self.disposed.lock().entry(reason).or_default() += 1;
    }

    fn chunk_forwarded(&self, token: &Token, bytes: usize) {
        *self.bytes.lock().entry(token.clone()).or_default() += bytes;
        *self.messages.lock().entry(token.clone()).or_default() += 1;
        self.sizes.lock().push(bytes);
    }
}
