//! Strandmq error types.
//!
//! One taxonomy for the whole engine: API misuse is reported to the
//! caller synchronously, peer protocol violations stay connection-local
//! and never surface as an `Err` on the local socket.

use thiserror::Error;

/// Main error type for socket operations.
#[derive(Error, Debug)]
pub enum SocketError {
    /// ROUTER/REP send without a routing-key frame
    #[error("router message must include a routing key")]
    RoutingKeyMissing,

    /// REQ send while a reply is still outstanding
    #[error("cannot send another request")]
    RequestPending,

    /// REP send while no request is being answered
    #[error("cannot send another reply")]
    ReplyNotActive,

    /// Operation not supported by this socket pattern
    #[error("not supported")]
    NotSupported,

    /// Address uses a transport scheme this build cannot speak
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// Malformed endpoint address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Bind target path is already registered
    #[error("address in use: {0}")]
    AddrInUse(String),

    /// No listener/bind found for the given address
    #[error("address not found: {0}")]
    NotFound(String),

    /// Attempt to send an empty multipart message
    #[error("message must contain at least one frame")]
    EmptyMessage,
}

/// Result type alias for socket operations.
pub type Result<T> = std::result::Result<T, SocketError>;

impl SocketError {
    /// Create an unsupported-transport error from an address.
    pub fn unsupported_transport(addr: impl Into<String>) -> Self {
        Self::UnsupportedTransport(addr.into())
    }

    /// Create an invalid-address error.
    pub fn invalid_address(addr: impl Into<String>) -> Self {
        Self::InvalidAddress(addr.into())
    }

    /// True for the errors that signal misuse of the strict
    /// request/reply turn-taking protocol.
    #[must_use]
    pub const fn is_turn_violation(&self) -> bool {
        matches!(self, Self::RequestPending | Self::ReplyNotActive)
    }
}
