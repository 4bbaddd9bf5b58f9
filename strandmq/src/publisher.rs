//! PUB pattern.
//!
//! An XPUB that keeps subscription bookkeeping for filtering but never
//! surfaces anything to the application: inbound messages and
//! subscription changes are absorbed silently.

use strandmq_core::error::Result;
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};
use crate::xpub::XPubPolicy;

#[derive(Debug)]
pub(crate) struct PubPolicy {
    inner: XPubPolicy,
}

impl PubPolicy {
    pub(crate) fn new() -> Self {
        Self {
            inner: XPubPolicy::with_delivery(false),
        }
    }
}

impl Pattern for PubPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.attached(ctx, pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.terminated(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        self.inner.send(ctx, msg)
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        self.inner.received(ctx, pipe, msg);
    }
}
