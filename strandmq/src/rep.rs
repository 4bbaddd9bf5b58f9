//! REP pattern.
//!
//! A ROUTER with strict request/reply turn-taking. The envelope of the
//! request being answered (routing key plus any intermediary hops, up
//! to the empty delimiter) is held aside and re-applied to the reply.
//! Requests arriving while one is being answered queue up and are
//! served in FIFO order as replies go out.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::trace;

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};
use crate::router::RouterCore;

#[derive(Debug, Default)]
pub(crate) struct RepPolicy {
    router: RouterCore,
    /// Envelope frames of the request currently being answered.
    envelope: Vec<Bytes>,
    /// Enveloped requests waiting their turn (routing key included).
    pending: VecDeque<Frames>,
    sending_reply: bool,
}

impl RepPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Unwind one enveloped request: stash the envelope, deliver the
    /// body. A request with no delimiter frame is malformed; it is
    /// dropped and the next queued request takes its place.
    fn open_request(&mut self, ctx: &mut SocketCtx<'_>, mut msg: Frames) {
        self.sending_reply = false;
        loop {
            let mut rest = msg.into_iter();
            let mut delimited = false;
            for frame in rest.by_ref() {
                if frame.is_empty() {
                    delimited = true;
                    break;
                }
                self.envelope.push(frame);
            }

            if delimited {
                self.sending_reply = true;
                ctx.deliver(rest.collect());
                return;
            }

            trace!("dropping request without envelope delimiter");
            self.envelope.clear();
            match self.pending.pop_front() {
                Some(next) => msg = next,
                None => return,
            }
        }
    }
}

impl Pattern for RepPolicy {
    fn attached(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.router.attached(pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.router.terminated(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        if !self.sending_reply {
            return Err(SocketError::ReplyNotActive);
        }

        let mut reply = std::mem::take(&mut self.envelope);
        reply.push(Bytes::new());
        reply.extend(msg);
        self.router.route(ctx, reply)?;

        match self.pending.pop_front() {
            Some(next) => self.open_request(ctx, next),
            None => self.sending_reply = false,
        }
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        let Some(enveloped) = self.router.ingest(ctx, pipe, msg) else {
            return;
        };

        if self.sending_reply {
            self.pending.push_back(enveloped);
        } else {
            self.open_request(ctx, enveloped);
        }
    }
}
