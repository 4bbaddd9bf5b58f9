//! DEALER pattern.
//!
//! Outbound messages round-robin across attached pipes; with no pipe
//! attached they wait in an unbounded pending queue and flush on the
//! next attach. Inbound messages from all pipes are fair-merged into
//! the application inbox.

use std::collections::VecDeque;

use strandmq_core::error::Result;
use strandmq_core::load_balancer::LoadBalancer;
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;

use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct DealerPolicy {
    lb: LoadBalancer,
    pending: VecDeque<Frames>,
}

impl DealerPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Pattern for DealerPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.lb.attach(pipe);

        while let Some(msg) = self.pending.pop_front() {
            if !self.lb.send(|p| ctx.send_to(p, &msg)) {
                self.pending.push_front(msg);
                break;
            }
        }
    }

    fn terminated(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.lb.terminated(pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        if !self.lb.send(|p| ctx.send_to(p, &msg)) {
            self.pending.push_back(msg);
        }
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, _pipe: PipeId, msg: Frames) {
        ctx.deliver(msg);
    }
}
