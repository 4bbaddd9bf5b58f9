//! Transport boundary.
//!
//! Sockets consume listeners only through the narrow [`Host`] contract
//! (path registration + connection handoff) and consume established
//! connections only as [`Link`]s carrying wire units. The in-tree
//! implementation is the in-process channel transport in [`memory`].

use bytes::Bytes;
use std::collections::HashMap;

use strandmq_core::error::SocketError;

pub mod memory;

pub use memory::MemoryHost;

/// Opaque per-connection metadata captured at accept time (the headers
/// analog of an HTTP upgrade).
pub type ConnMetadata = HashMap<String, String>;

/// One half of an established duplex connection carrying wire units.
#[derive(Debug)]
pub struct Link {
    tx: flume::Sender<Bytes>,
    rx: flume::Receiver<Bytes>,
}

/// Result of a non-blocking read on a link.
#[derive(Debug)]
pub enum LinkPoll {
    /// One wire unit arrived
    Unit(Bytes),
    /// Nothing pending
    Empty,
    /// The peer is gone; buffered units have all been drained
    Closed,
}

impl Link {
    /// Create a connected pair of links.
    pub(crate) fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = flume::unbounded();
        let (b_tx, b_rx) = flume::unbounded();
        (Self { tx: a_tx, rx: b_rx }, Self { tx: b_tx, rx: a_rx })
    }

    /// Write one wire unit; `false` means the peer is gone.
    pub(crate) fn send_unit(&self, unit: Bytes) -> bool {
        self.tx.send(unit).is_ok()
    }

    /// Non-blocking read of the next wire unit.
    pub(crate) fn poll(&self) -> LinkPoll {
        match self.rx.try_recv() {
            Ok(unit) => LinkPoll::Unit(unit),
            Err(flume::TryRecvError::Empty) => LinkPoll::Empty,
            Err(flume::TryRecvError::Disconnected) => LinkPoll::Closed,
        }
    }
}

/// An inbound connection handed off by a listener.
#[derive(Debug)]
pub struct Accepted {
    /// The server half of the connection
    pub link: Link,
    /// Connection metadata (headers analog), opaque to the engine
    pub metadata: ConnMetadata,
}

/// Guard for a path registration; dropping it deregisters the path.
pub struct Registration {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").finish_non_exhaustive()
    }
}

/// Listener contract consumed by `Socket::bind`.
///
/// A host owns an address and dispatches inbound connections to
/// registered paths; each registration yields a channel on which the
/// bound socket receives [`Accepted`] connections.
pub trait Host {
    /// The host's own address (e.g. `mem://broker`).
    fn address(&self) -> &str;

    /// Register a path and return the deregistration guard plus the
    /// handoff channel for connections arriving on that path.
    ///
    /// # Errors
    ///
    /// Fails with `AddrInUse` if the path is already registered.
    fn register_path(
        &self,
        path: &str,
    ) -> Result<(Registration, flume::Receiver<Accepted>), SocketError>;

    /// Deregister a path; connections already handed off are unaffected.
    fn remove_path(&self, path: &str);
}
