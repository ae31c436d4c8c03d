use std::time::Duration;

use crate::ids::Token;

/// Failure of a channel's write primitive.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The consumer went away or the channel was closed locally.
    #[error("channel closed")]
    Closed,
    /// The consumer did not accept the frame in time.
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),
    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors returned by the relay engine and the channel lifecycle adapter.
///
/// Every variant is recoverable by the caller; the HTTP boundary maps them
/// to status codes.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Token never issued, already disposed, or expired.
    #[error("token not found: {token}")]
    TokenNotFound { token: Token },
    /// Token is valid but no open consumer channel is bound to it.
    #[error("no channel bound to token {token}")]
    NoBoundChannel { token: Token },
    /// A channel has already been bound to this token; rebinding is refused.
    #[error("token {token} already has a bound channel")]
    AlreadyBound { token: Token },
    /// A connect attempt carried no token.
    #[error("no token supplied")]
    MissingToken,
    /// Writing a chunk to the bound channel failed mid-stream.
    #[error("write to channel for token {token} failed: {source}")]
    Write {
        token: Token,
        #[source]
        source: ChannelError,
    },
    /// Reading the inbound body failed mid-stream.
    #[error("reading request body for token {token} failed: {source}")]
    Read {
        token: Token,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Short classification string for logging and error bodies.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::TokenNotFound { .. } => "token_not_found",
            Self::NoBoundChannel { .. } => "no_bound_channel",
            Self::AlreadyBound { .. } => "already_bound",
            Self::MissingToken => "missing_token",
            Self::Write { .. } => "write_error",
            Self::Read { .. } => "read_error",
        }
    }

    /// Whether the failure happened while bytes were being streamed.
    pub fn is_stream_failure(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Read { .. })
    }
}
