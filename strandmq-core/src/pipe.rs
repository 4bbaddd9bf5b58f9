//! Opaque pipe handles.
//!
//! Index structures (`Distribution`, `LoadBalancer`, `MultiTrie`, the
//! ROUTER peer map) never hold endpoints directly; they hold `PipeId`
//! handles. The socket core owns the endpoints exclusively and removes
//! handles from every index when a pipe terminates, so a handle that is
//! still present in an index always refers to a live pipe.

use std::fmt;

/// Handle to one transport pipe owned by a socket.
///
/// Ids are assigned from a per-socket monotonic counter and never reused,
/// so a stale handle can never alias a newer pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub u64);

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe-{}", self.0)
    }
}
