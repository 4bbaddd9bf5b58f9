//! Partitioned fan-out set for the PUB/SUB family.
//!
//! The pipe set is a single ordered sequence logically split into three
//! contiguous zones by two cursors:
//!
//! ```text
//! [0, matching)      pipes matched in the current round
//! [matching, active) attached but unmatched
//! [active, len)      attached but passive (not yet eligible)
//! ```
//!
//! Membership changes are O(1) swaps across a cursor boundary. The
//! invariant `matching <= active <= len` holds after every operation.

use tracing::trace;

use crate::pipe::PipeId;

/// Fan-out set supporting "send to all attached" and "send to the subset
/// matched this round".
#[derive(Debug, Default)]
pub struct Distribution {
    pipes: Vec<PipeId>,
    matching: usize,
    active: usize,
}

impl Distribution {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipes: Vec::new(),
            matching: 0,
            active: 0,
        }
    }

    /// Attach a pipe into the active zone.
    pub fn attach(&mut self, pipe: PipeId) {
        self.pipes.push(pipe);
        let last = self.pipes.len() - 1;
        self.pipes.swap(self.active, last);
        self.active += 1;
    }

    /// Mark a pipe as matching for the next `send_to_matching`.
    ///
    /// Already-matching and passive pipes are left alone.
    pub fn matched(&mut self, pipe: PipeId) {
        let Some(index) = self.pipes.iter().position(|p| *p == pipe) else {
            return;
        };

        // Already matching.
        if index < self.matching {
            return;
        }

        // Passive pipes are not eligible.
        if index >= self.active {
            return;
        }

        self.pipes.swap(index, self.matching);
        self.matching += 1;
    }

    /// Reset the matching zone, typically before recomputing matches for
    /// a new publish round.
    pub fn unmatch(&mut self) {
        self.matching = 0;
    }

    /// Promote a passive pipe into the active zone.
    pub fn activated(&mut self, pipe: PipeId) {
        let Some(index) = self.pipes.iter().position(|p| *p == pipe) else {
            return;
        };
        if index < self.active {
            return;
        }

        self.pipes.swap(index, self.active);
        self.active += 1;
    }

    /// Remove a pipe, shrinking whichever zones contained it.
    pub fn terminated(&mut self, pipe: PipeId) {
        let Some(index) = self.pipes.iter().position(|p| *p == pipe) else {
            return;
        };

        if index < self.matching {
            self.matching -= 1;
        }
        if index < self.active {
            self.active -= 1;
        }

        // Order-preserving removal keeps the zones contiguous.
        self.pipes.remove(index);
    }

    /// Deliver to every attached (active) pipe.
    pub fn send_to_all(&mut self, write: impl FnMut(PipeId) -> bool) {
        self.matching = self.active;
        self.send_to_matching(write);
    }

    /// Deliver to the pipes matched this round.
    ///
    /// A failed write demotes that pipe out of the matching and active
    /// zones; the iteration index does not advance for the vacated slot
    /// because a different pipe now occupies it. `matching` strictly
    /// shrinks on every failure, so the loop terminates after at most
    /// `matching` failed writes.
    pub fn send_to_matching(&mut self, mut write: impl FnMut(PipeId) -> bool) {
        // No matching pipes: simply drop the message.
        if self.matching == 0 {
            return;
        }

        let mut i = 0;
        while i < self.matching {
            let pipe = self.pipes[i];
            if write(pipe) {
                i += 1;
            } else {
                trace!(%pipe, "write failed, demoting pipe to passive");

                // Swap out of the matching zone, then out of the active
                // zone; the pipe lands at the head of the passive zone.
                self.pipes.swap(i, self.matching - 1);
                self.matching -= 1;
                self.pipes.swap(self.matching, self.active - 1);
                self.active -= 1;
            }
        }
    }

    /// Number of pipes matched in the current round.
    #[must_use]
    pub fn matching(&self) -> usize {
        self.matching
    }

    /// Number of attached (eligible) pipes.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Total number of pipes, passive included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// True if no pipes are attached at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}
