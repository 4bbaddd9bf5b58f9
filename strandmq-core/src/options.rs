//! Socket options.

use bytes::Bytes;
use std::time::Duration;

/// Per-socket configuration.
///
/// Options are read at connect/accept time by the wire layer and at
/// receive time by the pattern policies.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Routing id announced in the transport-level identity handshake.
    /// May be empty; ROUTER peers then auto-assign an identity.
    pub routing_id: Bytes,

    /// When `false` (default), the pattern policy sees `attached` as soon
    /// as `connect()` is called and sends queue transparently until the
    /// transport connection completes. When `true`, `attached` and
    /// `terminated` track the live connection.
    pub immediate: bool,

    /// Fixed interval between reconnection attempts for outbound pipes.
    pub reconnect_interval: Duration,

    /// Deliver the peer's identity handshake to the pattern policy as a
    /// normal message (ROUTER-family sockets set this).
    pub recv_routing_id: bool,

    /// XPUB: forward duplicate (non-unique) subscription changes to the
    /// application as well.
    pub xpub_verbose: bool,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            routing_id: Bytes::new(),
            immediate: false,
            reconnect_interval: Duration::from_millis(100),
            recv_routing_id: false,
            xpub_verbose: false,
        }
    }
}

impl SocketOptions {
    /// Set the routing id announced to peers.
    #[must_use]
    pub fn with_routing_id(mut self, routing_id: impl Into<Bytes>) -> Self {
        self.routing_id = routing_id.into();
        self
    }

    /// Set immediate mode.
    #[must_use]
    pub const fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Set the reconnection interval.
    #[must_use]
    pub const fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set XPUB verbose mode.
    #[must_use]
    pub const fn with_xpub_verbose(mut self, verbose: bool) -> Self {
        self.xpub_verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SocketOptions::default();
        assert!(opts.routing_id.is_empty());
        assert!(!opts.immediate);
        assert!(!opts.recv_routing_id);
        assert!(!opts.xpub_verbose);
        assert_eq!(opts.reconnect_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_builders() {
        let opts = SocketOptions::default()
            .with_routing_id(&b"client-1"[..])
            .with_immediate(true)
            .with_reconnect_interval(Duration::from_millis(10))
            .with_xpub_verbose(true);

        assert_eq!(opts.routing_id, Bytes::from_static(b"client-1"));
        assert!(opts.immediate);
        assert!(opts.xpub_verbose);
        assert_eq!(opts.reconnect_interval, Duration::from_millis(10));
    }
}
