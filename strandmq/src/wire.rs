//! Per-connection pipe state machine.
//!
//! A `WirePipe` owns one transport connection end-to-end: framing,
//! the routing-id handshake, send queueing while disconnected, and the
//! reconnect timer for outbound pipes. It never touches pattern state;
//! everything the pattern layer needs to know comes out as
//! [`PipeEvent`]s from `poll`.
//!
//! State machine:
//!
//! ```text
//! outbound: Connecting -> Active <-> Reconnecting -> Closed
//! accepted: Active -> Closed
//! ```
//!
//! Accepted pipes never reconnect; when their connection drops the peer
//! is expected to dial back in, arriving as a brand-new pipe.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use strandmq_core::codec::{encode_frames, encode_unit, UnitDecoder};
use strandmq_core::endpoint::Endpoint;
use strandmq_core::message::Frames;
use strandmq_core::options::SocketOptions;
use strandmq_core::pipe::PipeId;

use crate::transport::{memory, ConnMetadata, Link, LinkPoll};

/// Connection lifecycle state of a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipeState {
    /// Closed for good; sends fail and nothing is queued
    Closed,
    /// Outbound, before the first successful connection
    Connecting,
    /// Outbound, between connections
    Reconnecting,
    /// Connection established
    Active,
}

/// What a pipe tells the pattern layer.
#[derive(Debug)]
pub(crate) enum PipeEvent {
    /// The pipe became usable from the pattern's point of view
    Attached,
    /// An outbound pipe re-established its connection
    Hiccuped,
    /// A complete multipart message arrived
    Message(Frames),
    /// Immediate mode: the live connection went away, but the pipe
    /// itself stays and keeps reconnecting
    Detached,
    /// The pipe is gone for good and must be dropped from all indexes
    Terminated,
}

pub(crate) type PipeEvents = SmallVec<[PipeEvent; 4]>;

/// One transport connection owned by a socket.
#[derive(Debug)]
pub(crate) struct WirePipe {
    id: PipeId,
    state: PipeState,
    accepted: bool,
    /// Dial target; `None` for accepted pipes.
    target: Option<Endpoint>,
    /// The address string as passed to `connect`, for `disconnect`.
    address: Option<String>,
    immediate: bool,
    recv_routing_id: bool,
    routing_id: Bytes,
    /// Identity assigned by a ROUTER-family owner, empty until assigned.
    routing_key: Bytes,
    reconnect_interval: Duration,
    link: Option<Link>,
    /// Encoded units written while not yet (re)connected.
    queue: VecDeque<Bytes>,
    decoder: UnitDecoder,
    /// Whether the peer's identity handshake was seen on this connection.
    routing_id_seen: bool,
    retry_at: Option<Instant>,
    metadata: ConnMetadata,
}

impl WirePipe {
    /// Create an outbound pipe. No connection attempt is made here; the
    /// owner calls [`Self::connect_now`] right after insertion.
    pub(crate) fn outbound(
        id: PipeId,
        target: Endpoint,
        address: String,
        options: &SocketOptions,
    ) -> Self {
        Self {
            id,
            state: PipeState::Connecting,
            accepted: false,
            target: Some(target),
            address: Some(address),
            immediate: options.immediate,
            recv_routing_id: options.recv_routing_id,
            routing_id: options.routing_id.clone(),
            routing_key: Bytes::new(),
            reconnect_interval: options.reconnect_interval,
            link: None,
            queue: VecDeque::new(),
            decoder: UnitDecoder::new(),
            routing_id_seen: false,
            retry_at: None,
            metadata: ConnMetadata::new(),
        }
    }

    /// Wrap an accepted connection. The identity handshake goes out
    /// right away and the pattern layer sees `Attached`.
    pub(crate) fn accepted(
        id: PipeId,
        link: Link,
        metadata: ConnMetadata,
        options: &SocketOptions,
    ) -> (Self, PipeEvents) {
        let pipe = Self {
            id,
            state: PipeState::Active,
            accepted: true,
            target: None,
            address: None,
            immediate: options.immediate,
            recv_routing_id: options.recv_routing_id,
            routing_id: options.routing_id.clone(),
            routing_key: Bytes::new(),
            reconnect_interval: options.reconnect_interval,
            link: Some(link),
            queue: VecDeque::new(),
            decoder: UnitDecoder::new(),
            routing_id_seen: false,
            retry_at: None,
            metadata,
        };

        if let Some(link) = &pipe.link {
            link.send_unit(encode_unit(&pipe.routing_id, false));
        }

        let mut events = PipeEvents::new();
        events.push(PipeEvent::Attached);
        (pipe, events)
    }

    pub(crate) fn state(&self) -> PipeState {
        self.state
    }

    pub(crate) fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub(crate) fn routing_key(&self) -> &Bytes {
        &self.routing_key
    }

    pub(crate) fn set_routing_key(&mut self, key: Bytes) {
        self.routing_key = key;
    }

    #[allow(dead_code)]
    pub(crate) fn metadata(&self) -> &ConnMetadata {
        &self.metadata
    }

    /// Write one multipart message.
    ///
    /// While connecting or reconnecting the encoded units are queued and
    /// flushed after the identity handshake of the next connection.
    /// Returns `false` only when the pipe cannot take the message at all
    /// (closed, or the live connection is already gone).
    pub(crate) fn send(&mut self, frames: &[Bytes]) -> bool {
        if frames.is_empty() {
            return false;
        }

        match self.state {
            PipeState::Closed => false,
            PipeState::Connecting | PipeState::Reconnecting => {
                self.queue.extend(encode_frames(frames));
                true
            }
            PipeState::Active => {
                let Some(link) = &self.link else {
                    return false;
                };
                for unit in encode_frames(frames) {
                    if !link.send_unit(unit) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Attempt to establish the connection now.
    pub(crate) fn connect_now(&mut self, now: Instant, events: &mut PipeEvents) {
        if self.state == PipeState::Closed || self.link.is_some() {
            return;
        }
        let Some(target) = self.target.clone() else {
            return;
        };

        self.routing_id_seen = false;
        self.decoder.reset();

        match memory::connect(&target) {
            Some(link) => {
                self.link = Some(link);
                self.retry_at = None;
                self.on_open(events);
            }
            None => {
                trace!(pipe = %self.id, %target, "connect attempt failed");
                if self.immediate
                    && matches!(self.state, PipeState::Active | PipeState::Connecting)
                {
                    events.push(PipeEvent::Detached);
                }
                self.retry_at = Some(now + self.reconnect_interval);
            }
        }
    }

    fn on_open(&mut self, events: &mut PipeEvents) {
        let previous = self.state;
        self.state = PipeState::Active;
        debug!(pipe = %self.id, ?previous, "connection established");

        if let Some(link) = &self.link {
            // Identity handshake first, then whatever queued up while
            // disconnected, in original order. A unit that fails to
            // write stays at the front of the queue for the next
            // connection; dropping it could merge two multipart
            // messages on the peer.
            link.send_unit(encode_unit(&self.routing_id, false));
            while let Some(unit) = self.queue.front() {
                if !link.send_unit(unit.clone()) {
                    break;
                }
                self.queue.pop_front();
            }
        }

        if self.immediate {
            events.push(PipeEvent::Attached);
        } else if previous == PipeState::Reconnecting {
            events.push(PipeEvent::Hiccuped);
        }
    }

    /// Drain inbound units and fire the reconnect timer if due.
    pub(crate) fn poll(&mut self, now: Instant, events: &mut PipeEvents) {
        if self.link.is_none()
            && matches!(self.state, PipeState::Connecting | PipeState::Reconnecting)
            && self.retry_at.is_some_and(|at| now >= at)
        {
            self.retry_at = None;
            self.connect_now(now, events);
        }

        loop {
            let polled = match &self.link {
                Some(link) => link.poll(),
                None => return,
            };

            match polled {
                LinkPoll::Unit(unit) => self.on_unit(unit, now, events),
                LinkPoll::Empty => return,
                LinkPoll::Closed => {
                    self.on_link_lost(now, events);
                    return;
                }
            }
        }
    }

    fn on_unit(&mut self, unit: Bytes, now: Instant, events: &mut PipeEvents) {
        match self.decoder.push_unit(unit) {
            Ok(None) => {}
            Ok(Some(frames)) => {
                if !self.routing_id_seen {
                    self.routing_id_seen = true;
                    if !self.recv_routing_id {
                        return;
                    }
                }
                events.push(PipeEvent::Message(frames));
            }
            Err(err) => {
                // Framing violation: sever this connection. Outbound
                // pipes fall back onto the reconnect path.
                warn!(pipe = %self.id, %err, "protocol violation, dropping connection");
                self.link = None;
                self.on_link_lost(now, events);
            }
        }
    }

    fn on_link_lost(&mut self, now: Instant, events: &mut PipeEvents) {
        self.link = None;
        self.decoder.reset();

        if self.accepted {
            if self.state != PipeState::Closed {
                self.state = PipeState::Closed;
                events.push(PipeEvent::Terminated);
            }
            return;
        }

        if self.state == PipeState::Closed {
            return;
        }

        if self.immediate && matches!(self.state, PipeState::Active | PipeState::Connecting) {
            events.push(PipeEvent::Detached);
        }
        if self.state == PipeState::Active {
            debug!(pipe = %self.id, "connection lost, reconnecting");
            self.state = PipeState::Reconnecting;
        }
        self.retry_at = Some(now + self.reconnect_interval);
    }

    /// Close the pipe for good.
    pub(crate) fn close(&mut self, events: &mut PipeEvents) {
        if self.state == PipeState::Closed {
            return;
        }
        self.state = PipeState::Closed;
        self.link = None;
        self.retry_at = None;
        self.queue.clear();
        self.decoder.reset();
        events.push(PipeEvent::Terminated);
    }
}
