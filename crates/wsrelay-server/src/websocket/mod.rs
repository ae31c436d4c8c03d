//! Consumer `WebSocket` transport.

pub mod channel;
pub mod session;
