//! Pattern policy seam.
//!
//! Each socket pattern (DEALER, ROUTER, XPUB, ...) is a policy object
//! that reacts to pipe lifecycle events and decides, per message, which
//! pipes to write and which inbound messages reach the application.
//! Policies never touch pipes directly; all access goes through
//! [`SocketCtx`], which the socket core constructs around its own state
//! for the duration of one callback.

use std::collections::VecDeque;

use bytes::Bytes;
use hashbrown::HashMap;

use strandmq_core::error::{Result, SocketError};
use strandmq_core::message::Frames;
use strandmq_core::options::SocketOptions;
use strandmq_core::pipe::PipeId;

use crate::wire::WirePipe;

/// Borrowed view of socket state handed to a policy callback.
pub(crate) struct SocketCtx<'a> {
    pub(crate) pipes: &'a mut HashMap<PipeId, WirePipe>,
    pub(crate) options: &'a SocketOptions,
    /// Messages ready for the application, oldest first.
    pub(crate) inbox: &'a mut VecDeque<Frames>,
    /// Pipes a policy asked to close; processed after the callback
    /// returns so the pipe map is never mutated reentrantly.
    pub(crate) deferred_close: &'a mut Vec<PipeId>,
}

impl SocketCtx<'_> {
    /// Write one message to a pipe; `false` if the pipe is gone or
    /// cannot take the message.
    pub(crate) fn send_to(&mut self, pipe: PipeId, frames: &[Bytes]) -> bool {
        self.pipes
            .get_mut(&pipe)
            .is_some_and(|p| p.send(frames))
    }

    /// Queue a message for the application.
    pub(crate) fn deliver(&mut self, frames: Frames) {
        self.inbox.push_back(frames);
    }

    /// Ask the core to close a pipe once this callback returns.
    pub(crate) fn close_pipe(&mut self, pipe: PipeId) {
        self.deferred_close.push(pipe);
    }

    pub(crate) fn routing_key(&self, pipe: PipeId) -> Option<Bytes> {
        self.pipes.get(&pipe).map(|p| p.routing_key().clone())
    }

    pub(crate) fn set_routing_key(&mut self, pipe: PipeId, key: Bytes) {
        if let Some(p) = self.pipes.get_mut(&pipe) {
            p.set_routing_key(key);
        }
    }
}

/// Behavior of one socket pattern.
///
/// `attached` fires when a pipe becomes usable, `terminated` when it
/// stops being usable (including immediate-mode detach), `hiccuped`
/// when an outbound pipe silently re-established its connection.
pub(crate) trait Pattern {
    fn attached(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId);

    fn terminated(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId);

    fn hiccuped(&mut self, _ctx: &mut SocketCtx<'_>, _pipe: PipeId) {}

    /// Route one outbound message.
    fn send(&mut self, ctx: &mut SocketCtx<'_>, msg: Frames) -> Result<()>;

    /// Handle one inbound message from a pipe.
    fn received(&mut self, ctx: &mut SocketCtx<'_>, pipe: PipeId, msg: Frames);

    fn subscribe(&mut self, _ctx: &mut SocketCtx<'_>, _topic: Bytes) -> Result<()> {
        Err(SocketError::NotSupported)
    }

    fn unsubscribe(&mut self, _ctx: &mut SocketCtx<'_>, _topic: Bytes) -> Result<()> {
        Err(SocketError::NotSupported)
    }
}
