//! PULL pattern.
//!
//! Receive-only: messages from all attached pipes merge into the inbox
//! in arrival order; sending is not supported.

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct PullPolicy;

impl PullPolicy {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl Pattern for PullPolicy {
    fn attached(&mut self, _ctx: &mut SocketCtx<'_>, _pipe: PipeId) {}

    fn terminated(&mut self, _ctx: &mut SocketCtx<'_>, _pipe: PipeId) {}

    fn send(&mut self, _ctx: &mut SocketCtx<'_>, _msg: Frames) -> Result<()> {
        Err(SocketError::NotSupported)
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, _pipe: PipeId, msg: Frames) {
        ctx.deliver(msg);
    }
}
