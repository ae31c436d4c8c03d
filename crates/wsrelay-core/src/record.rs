use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::channel::RelayChannel;
use crate::ids::Token;

/// Relay state for one token.
pub struct BindingRecord {
    token: Token,
    channel: Option<Arc<dyn RelayChannel>>,
    created_at: Instant,
}

impl BindingRecord {
    /// A freshly issued record with no consumer yet.
    pub fn unbound(token: Token) -> Self {
        Self {
            token,
            channel: None,
            created_at: Instant::now(),
        }
    }

    /// The owning token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The bound channel, if a consumer has connected.
    pub fn channel(&self) -> Option<&Arc<dyn RelayChannel>> {
        self.channel.as_ref()
    }

    /// Attach a consumer channel.
    pub(crate) fn bind(&mut self, channel: Arc<dyn RelayChannel>) {
        self.channel = Some(channel);
    }

    /// Whether a channel is bound.
    pub fn is_bound(&self) -> bool {
        self.channel.is_some()
    }

    /// Liveness predicate for the expiry sweep: keep while a bound channel
    /// is still open.
    pub fn is_live(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_open())
    }

    /// Time since issuance.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for BindingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRecord")
            .field("token", &self.token)
            .field("bound", &self.is_bound())
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}
