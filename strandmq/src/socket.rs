//! Socket facade and event loop.
//!
//! A socket is a pattern policy plus a set of wire pipes and bound
//! listeners, driven entirely from `poll`: accepted connections become
//! pipes, pipe events dispatch into the policy, and due reconnect
//! timers fire. All pattern and wire state belongs to the one logical
//! owner of the `Socket`, so no locking happens anywhere on the message
//! path.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use hashbrown::HashMap;
use smallvec::smallvec;
use tracing::debug;

use strandmq_core::endpoint::Endpoint;
use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::{Frames, Message};
use strandmq_core::options::SocketOptions;
use strandmq_core::pipe::PipeId;

use crate::dealer::DealerPolicy;
use crate::pair::PairPolicy;
use crate::pattern::{Pattern, SocketCtx};
use crate::publisher::PubPolicy;
use crate::pull::PullPolicy;
use crate::push::PushPolicy;
use crate::rep::RepPolicy;
use crate::req::ReqPolicy;
use crate::router::RouterPolicy;
use crate::subscriber::SubPolicy;
use crate::transport::{Accepted, Host, Registration};
use crate::wire::{PipeEvent, PipeEvents, WirePipe};
use crate::xpub::XPubPolicy;
use crate::xsub::XSubPolicy;

/// The available socket patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    Pair,
    Pub,
    Sub,
    Req,
    Rep,
    Dealer,
    Router,
    Pull,
    Push,
    XPub,
    XSub,
}

impl SocketType {
    /// Patterns that consume the peer's identity handshake themselves.
    fn is_router_family(self) -> bool {
        matches!(self, Self::Router | Self::Rep)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn build_policy(kind: SocketType) -> Box<dyn Pattern> {
    match kind {
        SocketType::Pair => Box::new(PairPolicy::new()),
        SocketType::Pub => Box::new(PubPolicy::new()),
        SocketType::Sub => Box::new(SubPolicy::new()),
        SocketType::Req => Box::new(ReqPolicy::new()),
        SocketType::Rep => Box::new(RepPolicy::new()),
        SocketType::Dealer => Box::new(DealerPolicy::new()),
        SocketType::Router => Box::new(RouterPolicy::new()),
        SocketType::Pull => Box::new(PullPolicy::new()),
        SocketType::Push => Box::new(PushPolicy::new()),
        SocketType::XPub => Box::new(XPubPolicy::new()),
        SocketType::XSub => Box::new(XSubPolicy::new()),
    }
}

struct BoundListener {
    address: String,
    accepted_rx: flume::Receiver<Accepted>,
    _registration: Registration,
}

struct SocketCore {
    options: SocketOptions,
    pipes: HashMap<PipeId, WirePipe>,
    binds: Vec<BoundListener>,
    inbox: VecDeque<Frames>,
    deferred_close: Vec<PipeId>,
    next_pipe: u64,
}

impl SocketCore {
    fn alloc_pipe(&mut self) -> PipeId {
        let id = PipeId(self.next_pipe);
        self.next_pipe += 1;
        id
    }
}

/// A messaging socket of one of the supported patterns.
pub struct Socket {
    kind: SocketType,
    core: SocketCore,
    policy: Box<dyn Pattern>,
}

/// Create a socket of the given pattern with default options.
#[must_use]
pub fn socket(kind: SocketType) -> Socket {
    Socket::new(kind)
}

impl Socket {
    /// Create a socket with default options.
    #[must_use]
    pub fn new(kind: SocketType) -> Self {
        Self::with_options(kind, SocketOptions::default())
    }

    /// Create a socket with explicit options.
    #[must_use]
    pub fn with_options(kind: SocketType, mut options: SocketOptions) -> Self {
        options.recv_routing_id = kind.is_router_family();
        Self {
            kind,
            core: SocketCore {
                options,
                pipes: HashMap::new(),
                binds: Vec::new(),
                inbox: VecDeque::new(),
                deferred_close: Vec::new(),
                next_pipe: 0,
            },
            policy: build_policy(kind),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SocketType {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &SocketOptions {
        &self.core.options
    }

    /// Mutable access to the socket options.
    ///
    /// Connection-level options (routing id, immediate, reconnect
    /// interval) only affect pipes created after the change.
    pub fn options_mut(&mut self) -> &mut SocketOptions {
        &mut self.core.options
    }

    /// Dial an endpoint. The pipe owns reconnection from here on; if the
    /// target does not exist yet, the pipe keeps retrying on the
    /// reconnect interval until it does.
    pub fn connect(&mut self, address: &str) -> Result<()> {
        let endpoint: Endpoint = address.parse().map_err(SocketError::from)?;

        let id = self.core.alloc_pipe();
        let pipe = WirePipe::outbound(id, endpoint, address.to_string(), &self.core.options);
        self.core.pipes.insert(id, pipe);
        debug!(socket = %self.kind, pipe = %id, address, "connecting");

        // Without the immediate option the pattern sees the pipe as soon
        // as it exists; sends queue until the connection completes.
        if !self.core.options.immediate {
            self.dispatch(id, smallvec![PipeEvent::Attached]);
        }

        let mut events = PipeEvents::new();
        if let Some(pipe) = self.core.pipes.get_mut(&id) {
            pipe.connect_now(Instant::now(), &mut events);
        }
        self.dispatch(id, events);
        Ok(())
    }

    /// Drop the pipe dialing (or connected to) `address`.
    pub fn disconnect(&mut self, address: &str) -> Result<()> {
        let found = self
            .core
            .pipes
            .iter()
            .find(|(_, pipe)| pipe.address() == Some(address))
            .map(|(id, _)| *id);

        let Some(id) = found else {
            return Err(SocketError::NotFound(address.to_string()));
        };
        debug!(socket = %self.kind, pipe = %id, address, "disconnecting");
        self.drop_pipe(id);
        Ok(())
    }

    /// Accept connections for the host's root path.
    pub fn bind(&mut self, host: &dyn Host) -> Result<()> {
        self.bind_addr(host, host.address())
    }

    /// Accept connections for the path component of `address` on `host`.
    pub fn bind_addr(&mut self, host: &dyn Host, address: &str) -> Result<()> {
        let endpoint: Endpoint = address.parse().map_err(SocketError::from)?;
        let Endpoint::Memory { path, .. } = endpoint;

        let (registration, accepted_rx) = host.register_path(&path)?;
        debug!(socket = %self.kind, address, "bound");
        self.core.binds.push(BoundListener {
            address: address.to_string(),
            accepted_rx,
            _registration: registration,
        });
        Ok(())
    }

    /// Stop accepting connections for `address`. Pipes already accepted
    /// stay up.
    pub fn unbind(&mut self, address: &str) -> Result<()> {
        let before = self.core.binds.len();
        self.core.binds.retain(|bind| bind.address != address);
        if self.core.binds.len() == before {
            return Err(SocketError::NotFound(address.to_string()));
        }
        Ok(())
    }

    /// Close every pipe and bind. The socket stays usable; undelivered
    /// inbox messages remain readable.
    pub fn close(&mut self) {
        self.core.binds.clear();
        let ids: Vec<PipeId> = self.core.pipes.keys().copied().collect();
        for id in ids {
            self.drop_pipe(id);
        }
    }

    /// Send one multipart message according to the pattern's rules.
    ///
    /// # Errors
    ///
    /// Pattern misuse (sending on SUB/PULL, breaking REQ/REP
    /// turn-taking, ROUTER message without routing key) is reported
    /// synchronously; delivery itself is not acknowledged.
    pub fn send(&mut self, msg: impl Into<Message>) -> Result<()> {
        let msg: Message = msg.into();
        let frames = msg.into_frames();
        if frames.is_empty() {
            return Err(SocketError::EmptyMessage);
        }
        self.with_policy(|policy, ctx| policy.send(ctx, frames))
    }

    /// Subscribe to a topic prefix (SUB/XSUB only).
    pub fn subscribe(&mut self, topic: impl Into<Bytes>) -> Result<()> {
        let topic = topic.into();
        self.with_policy(|policy, ctx| policy.subscribe(ctx, topic))
    }

    /// Unsubscribe from a topic prefix (SUB/XSUB only).
    pub fn unsubscribe(&mut self, topic: impl Into<Bytes>) -> Result<()> {
        let topic = topic.into();
        self.with_policy(|policy, ctx| policy.unsubscribe(ctx, topic))
    }

    /// Drive the socket: accept pending connections, drain pipe input,
    /// fire due reconnect timers.
    pub fn poll(&mut self) {
        let now = Instant::now();

        let mut accepted = Vec::new();
        for bind in &self.core.binds {
            while let Ok(conn) = bind.accepted_rx.try_recv() {
                accepted.push(conn);
            }
        }
        for conn in accepted {
            let id = self.core.alloc_pipe();
            let (pipe, events) = WirePipe::accepted(id, conn.link, conn.metadata, &self.core.options);
            self.core.pipes.insert(id, pipe);
            debug!(socket = %self.kind, pipe = %id, "accepted connection");
            self.dispatch(id, events);
        }

        let ids: Vec<PipeId> = self.core.pipes.keys().copied().collect();
        for id in ids {
            let mut events = PipeEvents::new();
            if let Some(pipe) = self.core.pipes.get_mut(&id) {
                pipe.poll(now, &mut events);
            }
            self.dispatch(id, events);
        }
    }

    /// Poll once and take the oldest ready message, if any.
    pub fn try_recv(&mut self) -> Option<Frames> {
        self.poll();
        self.core.inbox.pop_front()
    }

    /// Poll until a message arrives.
    pub fn recv(&mut self) -> Frames {
        loop {
            if let Some(msg) = self.try_recv() {
                return msg;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Poll until a message arrives or `timeout` elapses.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Frames> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(msg) = self.try_recv() {
                return Some(msg);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn with_policy<R>(
        &mut self,
        f: impl FnOnce(&mut dyn Pattern, &mut SocketCtx<'_>) -> R,
    ) -> R {
        let core = &mut self.core;
        let mut ctx = SocketCtx {
            pipes: &mut core.pipes,
            options: &core.options,
            inbox: &mut core.inbox,
            deferred_close: &mut core.deferred_close,
        };
        let result = f(self.policy.as_mut(), &mut ctx);
        self.flush_deferred();
        result
    }

    fn dispatch(&mut self, id: PipeId, events: PipeEvents) {
        for event in events {
            match event {
                PipeEvent::Attached => {
                    self.with_policy(|policy, ctx| policy.attached(ctx, id));
                }
                PipeEvent::Hiccuped => {
                    self.with_policy(|policy, ctx| policy.hiccuped(ctx, id));
                }
                PipeEvent::Message(frames) => {
                    self.with_policy(|policy, ctx| policy.received(ctx, id, frames));
                }
                PipeEvent::Detached => {
                    self.with_policy(|policy, ctx| policy.terminated(ctx, id));
                }
                PipeEvent::Terminated => {
                    self.with_policy(|policy, ctx| policy.terminated(ctx, id));
                    self.core.pipes.remove(&id);
                }
            }
        }
    }

    /// Close one pipe and purge it from the pattern's indexes.
    fn drop_pipe(&mut self, id: PipeId) {
        let Some(pipe) = self.core.pipes.get_mut(&id) else {
            return;
        };
        let mut events = PipeEvents::new();
        pipe.close(&mut events);
        // `close` reports Terminated at most once; dispatch removes the
        // pipe from the map after the policy drops its references.
        self.dispatch(id, events);
    }

    fn flush_deferred(&mut self) {
        while let Some(id) = self.core.deferred_close.pop() {
            self.drop_pipe(id);
        }
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("kind", &self.kind)
            .field("pipes", &self.core.pipes.len())
            .field("binds", &self.core.binds.len())
            .field("inbox", &self.core.inbox.len())
            .finish()
    }
}
