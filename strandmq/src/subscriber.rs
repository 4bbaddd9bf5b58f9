//! SUB pattern.
//!
//! An XSUB whose upstream side is limited to the `subscribe` /
//! `unsubscribe` calls, which synthesize the control frames an XSUB
//! application would send by hand; arbitrary sends are refused.

use bytes::Bytes;

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;
use strandmq_core::subscription::SubscriptionEvent;

use crate::pattern::{Pattern, SocketCtx};
use crate::xsub::XSubPolicy;

#[derive(Debug, Default)]
pub(crate) struct SubPolicy {
    inner: XSubPolicy,
}

impl SubPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for SubPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.attached(ctx, pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.terminated(ctx, pipe);
    }

    fn hiccuped(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.hiccuped(ctx, pipe);
    }

    fn send(&mut self, _ctx: &mut SocketCtx<'_>, _msg: Frames) -> Result<()> {
        Err(SocketError::NotSupported)
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        self.inner.received(ctx, pipe, msg);
    }

    fn subscribe(&mut self, ctx: &mut SocketCtx<'_>, topic: Bytes) -> Result<()> {
        let frame = SubscriptionEvent::Subscribe(topic).to_frame();
        self.inner.send(ctx, vec![frame])
    }

    fn unsubscribe(&mut self, ctx: &mut SocketCtx<'_>, topic: Bytes) -> Result<()> {
        let frame = SubscriptionEvent::Unsubscribe(topic).to_frame();
        self.inner.send(ctx, vec![frame])
    }
}
