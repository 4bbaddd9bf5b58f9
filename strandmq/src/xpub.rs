//! XPUB pattern.
//!
//! Publishes fan out to exactly the pipes whose subscriptions match the
//! leading topic frame. Inbound control frames update the per-pipe
//! subscription trie; a change is forwarded to the application only
//! when it flips the overall subscriber count for that prefix (or
//! always, with the verbose option). When a subscriber disconnects,
//! synthetic unsubscribes for its now-empty prefixes surface the same
//! way.

use bytes::Bytes;

use strandmq_core::distribution::Distribution;
use strandmq_core::error::Result;
use strandmq_core::message::Frames;
use strandmq_core::mtrie::MultiTrie;
use strandmq_core::pipe::PipeId;
use strandmq_core::subscription::SubscriptionEvent;

use crate::pattern::{Pattern, SocketCtx};

#[derive(Debug)]
pub(crate) struct XPubPolicy {
    subscriptions: MultiTrie,
    dist: Distribution,
    /// Deliver inbound messages (subscription changes included) to the
    /// application. PUB turns this off.
    deliver: bool,
}

impl XPubPolicy {
    pub(crate) fn new() -> Self {
        Self::with_delivery(true)
    }

    pub(crate) fn with_delivery(deliver: bool) -> Self {
        Self {
            subscriptions: MultiTrie::new(),
            dist: Distribution::new(),
            deliver,
        }
    }
}

impl Pattern for XPubPolicy {
    fn attached(&mut self, _ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        self.dist.attach(pipe);
    }

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId) {
        let mut emptied: Vec<Bytes> = Vec::new();
        self.subscriptions.remove_pipe(pipe, |prefix| {
            emptied.push(Bytes::copy_from_slice(prefix));
        });
        self.dist.terminated(pipe);

        if self.deliver {
            for prefix in emptied {
                ctx.deliver(vec![SubscriptionEvent::Unsubscribe(prefix).to_frame()]);
            }
        }
    }

    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()> {
        let Some(topic) = msg.first() else {
            return Ok(());
        };

        self.dist.unmatch();
        self.subscriptions
            .match_topic(topic, |p| self.dist.matched(p));
        self.dist.send_to_matching(|p| ctx.send_to(p, &msg));
        Ok(())
    }

    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames) {
        match msg.first().and_then(SubscriptionEvent::from_frame) {
            Some(event) => {
                let unique = match &event {
                    SubscriptionEvent::Subscribe(topic) => {
                        self.subscriptions.add(topic, pipe)
                    }
                    SubscriptionEvent::Unsubscribe(topic) => {
                        self.subscriptions.remove(topic, pipe)
                    }
                };
                if self.deliver && (unique || ctx.options.xpub_verbose) {
                    ctx.deliver(msg);
                }
            }
            None => {
                // XSUB peers may send ordinary messages upstream.
                if self.deliver {
                    ctx.deliver(msg);
                }
            }
        }
    }
}
