//! PUSH pattern.
//!
//! Same distribution behavior as DEALER, but strictly one-way: inbound
//! messages are discarded.

use tracing::trace;

use strandmq_core::error::Result;
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::dealer::DealerPolicy;
use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct PushPolicy {
    inner: DealerPolicy,
}

impl PushPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for PushPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.attached(ctx, pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.inner.terminated(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        self.inner.send(ctx, msg)
    }

    fn received(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId, _msg: Frames) {
        trace!(%pipe, "push socket discarding inbound message");
    }
}
