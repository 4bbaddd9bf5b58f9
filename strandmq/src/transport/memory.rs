//! In-process channel transport.
//!
//! Hosts live in a process-wide registry keyed by name; `mem://name/path`
//! connects resolve through the registry to the acceptor registered for
//! that path. Connection handoff is a channel send, so binds and
//! connects may happen on different threads.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use strandmq_core::endpoint::Endpoint;
use strandmq_core::error::SocketError;

use super::{Accepted, ConnMetadata, Host, Link, Registration};

static HOSTS: Lazy<DashMap<String, Arc<HostPaths>>> = Lazy::new(DashMap::new);

#[derive(Debug, Default)]
struct HostPaths {
    paths: DashMap<String, flume::Sender<Accepted>>,
}

/// An in-process listener registered under `mem://<name>`.
///
/// Dropping the host removes it from the registry; outbound pipes
/// targeting it go back to retrying until a host with the same name
/// appears again.
#[derive(Debug)]
pub struct MemoryHost {
    name: String,
    address: String,
    paths: Arc<HostPaths>,
}

impl MemoryHost {
    /// Register a new host under the given `mem://name` address.
    ///
    /// # Errors
    ///
    /// Fails with `AddrInUse` if a host with that name already exists,
    /// or with an address error if the address does not parse.
    pub fn new(address: &str) -> Result<Self, SocketError> {
        let endpoint = Endpoint::parse(address).map_err(SocketError::from)?;
        let Endpoint::Memory { host: name, .. } = endpoint;

        let paths = Arc::new(HostPaths::default());
        match HOSTS.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(SocketError::AddrInUse(address.to_string()));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&paths));
            }
        }

        debug!(host = %name, "memory host registered");
        Ok(Self {
            address: format!("mem://{name}"),
            name,
            paths,
        })
    }

    /// Remove the host from the registry ahead of drop.
    ///
    /// Already-established connections keep working; new connects to
    /// this name start failing (and retrying) immediately.
    pub fn close(&self) {
        HOSTS.remove_if(&self.name, |_, paths| Arc::ptr_eq(paths, &self.paths));
        self.paths.paths.clear();
    }
}

impl Drop for MemoryHost {
    fn drop(&mut self) {
        HOSTS.remove_if(&self.name, |_, paths| Arc::ptr_eq(paths, &self.paths));
    }
}

impl Host for MemoryHost {
    fn address(&self) -> &str {
        &self.address
    }

    fn register_path(
        &self,
        path: &str,
    ) -> Result<(Registration, flume::Receiver<Accepted>), SocketError> {
        let (tx, rx) = flume::unbounded();
        match self.paths.paths.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(SocketError::AddrInUse(format!("{}{path}", self.address)));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }

        debug!(host = %self.name, path, "path registered");
        let paths = Arc::clone(&self.paths);
        let owned = path.to_string();
        let registration = Registration::new(move || {
            paths.paths.remove(&owned);
        });
        Ok((registration, rx))
    }

    fn remove_path(&self, path: &str) {
        self.paths.paths.remove(path);
    }
}

/// Attempt to open a connection to a registered host path.
///
/// Returns `None` when no such host/path is currently registered or the
/// acceptor is gone; the caller treats that as a failed attempt and
/// retries on its reconnect timer.
pub(crate) fn connect(endpoint: &Endpoint) -> Option<Link> {
    let Endpoint::Memory { host, path } = endpoint;

    let acceptor = {
        let entry = HOSTS.get(host)?;
        let acceptor = entry.paths.get(path)?;
        acceptor.value().clone()
    };

    let (local, remote) = Link::pair();
    let mut metadata = ConnMetadata::new();
    metadata.insert("host".to_string(), host.clone());
    metadata.insert("path".to_string(), path.clone());

    acceptor
        .send(Accepted {
            link: remote,
            metadata,
        })
        .ok()?;
    Some(local)
}
