//! PAIR pattern.
//!
//! Exactly one peer at a time: the first attached pipe becomes the
//! bound peer and any further pipe is closed on arrival. Messages sent
//! while no peer is bound wait in a pending queue.

use std::collections::VecDeque;

use tracing::debug;

use strandmq_core::error::Result;
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct PairPolicy {
    bound: Option<PipeId>,
    pending: VecDeque<Frames>,
}

impl PairPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for PairPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        if self.bound.is_some() {
            debug!(%pipe, "pair socket already has a peer, closing extra pipe");
            ctx.close_pipe(pipe);
            return;
        }

        self.bound = Some(pipe);
        while let Some(msg) = self.pending.pop_front() {
            if !ctx.send_to(pipe, &msg) {
                self.pending.push_front(msg);
                break;
            }
        }
    }

    fn terminated(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        if self.bound == Some(pipe) {
            self.bound = None;
        }
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        match self.bound {
            Some(pipe) => {
                if !ctx.send_to(pipe, &msg) {
                    self.pending.push_back(msg);
                }
            }
            None => self.pending.push_back(msg),
        }
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        // Messages from a pipe that lost the race for the peer slot are
        // ignored.
        if self.bound == Some(pipe) {
            ctx.deliver(msg);
        }
    }
}
