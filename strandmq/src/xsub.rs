//! XSUB pattern.
//!
//! Subscription changes travel upstream as control frames; data travels
//! downstream and is filtered locally against the subscription trie, so
//! a publisher that has not processed an unsubscribe yet cannot leak
//! messages through. On attach and on every reconnect the full
//! subscription set is replayed to the publisher.

use bytes::Bytes;
use smallvec::SmallVec;

use strandmq_core::distribution::Distribution;
use strandmq_core::error::Result;
use strandmq_core::message::Frames;
use strandmq_core::pipe::PipeId;
use strandmq_core::subscription::SubscriptionEvent;
use strandmq_core::trie::Trie;

use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug, Default)]
pub(crate) struct XSubPolicy {
    subscriptions: Trie,
    dist: Distribution,
}

impl XSubPolicy {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn replay_subscriptions(&self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        let mut frames: SmallVec<[Bytes; 8]> = SmallVec::new();
        self.subscriptions.for_each(|prefix| {
            frames.push(SubscriptionEvent::Subscribe(Bytes::copy_from_slice(prefix)).to_frame());
        });
        for frame in frames {
            ctx.send_to(pipe, &[frame]);
        }
    }
}

impl Pattern for XSubPolicy {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.dist.attach(pipe);
        self.replay_subscriptions(ctx, pipe);
    }

    fn terminated(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.dist.terminated(pipe);
    }

    fn hiccuped(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        // The publisher lost our subscription state with the old
        // connection; re-establish it.
        self.replay_subscriptions(ctx, pipe);
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        match msg.first().and_then(SubscriptionEvent::from_frame) {
            Some(SubscriptionEvent::Subscribe(topic)) => {
                // Duplicate subscribes are forwarded as well; the
                // publisher keeps its own counts.
                self.subscriptions.add(&topic);
                self.dist.send_to_all(|p| ctx.send_to(p, &msg));
            }
            Some(SubscriptionEvent::Unsubscribe(topic)) => {
                if self.subscriptions.remove(&topic) {
                    self.dist.send_to_all(|p| ctx.send_to(p, &msg));
                }
            }
            None => {
                // Not a control frame; XSUB may talk upstream freely.
                self.dist.send_to_all(|p| ctx.send_to(p, &msg));
            }
        }
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, _pipe: PipeId, msg: Frames) {
        let Some(topic) = msg.first() else {
            return;
        };
        if self.subscriptions.check(topic) {
            ctx.deliver(msg);
        }
    }
}
