//! REQ pattern.
//!
//! A DEALER with strict send/receive alternation and automatic envelope
//! handling: each request goes out with an empty delimiter frame on the
//! bottom, each reply must come back with one, and a second send before
//! the reply arrives is refused.

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::dealer::DealerPolicy;
use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct ReqPolicy {
    dealer: DealerPolicy,
    awaiting_reply: bool,
}

impl ReqPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for ReqPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.dealer.attached(ctx, pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.dealer.terminated(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        if self.awaiting_reply {
            return Err(SocketError::RequestPending);
        }

        let mut enveloped = Vec::with_capacity(msg.len() + 1);
        enveloped.push(bytes::Bytes::new());
        enveloped.extend(msg);
        self.dealer.send(ctx, enveloped)?;

        self.awaiting_reply = true;
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, _pipe: PipeId, msg: Frames) {
        // Anything that is not the awaited, well-formed reply is noise
        // from a stale or confused peer; drop it.
        if !self.awaiting_reply {
            return;
        }
        if msg.len() < 2 || !msg[0].is_empty() {
            return;
        }

        self.awaiting_reply = false;
        ctx.deliver(msg.into_iter().skip(1).collect());
    }
}
