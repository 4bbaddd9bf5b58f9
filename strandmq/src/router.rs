//! ROUTER pattern.
//!
//! Every peer is known by a routing key. A freshly attached pipe is
//! anonymous until its first inbound message (the identity handshake):
//! a non-empty first frame declares an identity and gets keyed as
//! `[0x00][identity]`, an empty one gets an auto-assigned
//! `[0x01][u32 be counter]` key. Subsequent inbound messages are
//! delivered with the routing key prepended; outbound messages must
//! carry the target's routing key as their first frame.

use bytes::{BufMut, Bytes, BytesMut};
use hashbrown::HashMap;
use tracing::{debug, trace};

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};

/// Routing state shared by ROUTER and REP.
#[derive(Debug, Default)]
pub(crate) struct RouterCore {
    peers: HashMap<Bytes, PipeId>,
    /// Pipes whose identity handshake has not arrived yet.
    anonymous: Vec<PipeId>,
    next_auto_id: u32,
}

impl RouterCore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attached(&mut self, pipe: PipeId) {
        self.anonymous.push(pipe);
    }

    pub(crate) fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.anonymous.retain(|p| *p != pipe);
        if let Some(key) = ctx.routing_key(pipe) {
            if self.peers.get(&key) == Some(&pipe) {
                self.peers.remove(&key);
            }
        }
    }

    /// Absorb one inbound message.
    ///
    /// The first message from an anonymous pipe is its identity
    /// handshake and is consumed here; later messages come back with the
    /// routing key prepended, ready for delivery.
    pub(crate) fn ingest(
        &mut self,
        ctx: &mut SocketCtx<'_>,
        pipe: PipeId,
        msg: Frames,
    ) -> Option<Frames> {
        if let Some(at) = self.anonymous.iter().position(|p| *p == pipe) {
            self.anonymous.swap_remove(at);

            let declared = msg.first().map(Bytes::clone).unwrap_or_default();
            let key = if declared.is_empty() {
                let mut key = BytesMut::with_capacity(5);
                key.put_u8(0x01);
                key.put_u32(self.next_auto_id);
                self.next_auto_id += 1;
                key.freeze()
            } else {
                let mut key = BytesMut::with_capacity(1 + declared.len());
                key.put_u8(0x00);
                key.put_slice(&declared);
                key.freeze()
            };

            debug!(%pipe, "peer identified");
            ctx.set_routing_key(pipe, key.clone());
            self.peers.insert(key, pipe);
            return None;
        }

        let key = ctx.routing_key(pipe)?;
        let mut out = Vec::with_capacity(msg.len() + 1);
        out.push(key);
        out.extend(msg);
        Some(out)
    }

    /// Route one outbound message by its leading routing-key frame.
    ///
    /// A message for a peer that is no longer connected is silently
    /// dropped; routed-message delivery is best effort by design of the
    /// pattern, not an error the sender can act on.
    pub(crate) fn route(&mut self, ctx: &mut SocketCtx<'_>, mut msg: Frames) -> Result<()> {
        if msg.len() <= 1 {
            return Err(SocketError::RoutingKeyMissing);
        }

        let key = msg.remove(0);
        let Some(&pipe) = self.peers.get(&key) else {
            trace!("dropping message for unknown routing key");
            return Ok(());
        };

        ctx.send_to(pipe, &msg);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RouterPolicy {
    core: RouterCore,
}

impl RouterPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for RouterPolicy {
    fn attached(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.core.attached(pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.core.terminated(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        self.core.route(ctx, msg)
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        if let Some(enveloped) = self.core.ingest(ctx, pipe, msg) {
            ctx.deliver(enveloped);
        }
    }
}
