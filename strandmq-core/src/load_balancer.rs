//! Round-robin pipe selection for single-destination fan-out.
//!
//! DEALER and PUSH sockets hand each outbound message to exactly one of
//! their attached pipes, rotating through them in attach order.

use crate::pipe::PipeId;

/// Round-robin selector over attached pipes.
///
/// The actual write is delegated to a callback so the selector can be
/// tested in isolation from any transport. A failed write is *not*
/// retried against another pipe; the caller is responsible for
/// re-queueing.
#[derive(Debug, Default)]
pub struct LoadBalancer {
    pipes: Vec<PipeId>,
    current: usize,
}

impl LoadBalancer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipes: Vec::new(),
            current: 0,
        }
    }

    /// Attach a pipe at the end of the rotation.
    pub fn attach(&mut self, pipe: PipeId) {
        self.pipes.push(pipe);
    }

    /// Remove a terminated pipe.
    ///
    /// If the cursor pointed at the last slot it is reset to 0 so it
    /// cannot land out of range after the removal.
    pub fn terminated(&mut self, pipe: PipeId) {
        let Some(index) = self.pipes.iter().position(|p| *p == pipe) else {
            return;
        };

        if self.current == self.pipes.len() - 1 {
            self.current = 0;
        }

        self.pipes.remove(index);
    }

    /// Attempt one send via the pipe at the cursor.
    ///
    /// Returns `false` if no pipes are attached or if the chosen pipe's
    /// write failed; the cursor advances either way.
    pub fn send(&mut self, mut write: impl FnMut(PipeId) -> bool) -> bool {
        if self.pipes.is_empty() {
            return false;
        }

        let result = write(self.pipes[self.current]);
        self.current = (self.current + 1) % self.pipes.len();

        result
    }

    /// Number of attached pipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// True if no pipes are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_with_no_pipes_fails() {
        let mut lb = LoadBalancer::new();
        assert!(!lb.send(|_| true));
    }

    #[test]
    fn test_round_robin_order() {
        let mut lb = LoadBalancer::new();
        lb.attach(PipeId(1));
        lb.attach(PipeId(2));
        lb.attach(PipeId(3));

        let mut seen = Vec::new();
        for _ in 0..6 {
            assert!(lb.send(|p| {
                seen.push(p.0);
                true
            }));
        }
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_failed_write_is_not_retried() {
        let mut lb = LoadBalancer::new();
        lb.attach(PipeId(1));
        lb.attach(PipeId(2));

        // First pipe refuses; the selector reports failure and still
        // advances to the next pipe for the following send.
        assert!(!lb.send(|p| p != PipeId(1)));
        let mut seen = Vec::new();
        assert!(lb.send(|p| {
            seen.push(p.0);
            true
        }));
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn test_terminated_resets_cursor_at_end() {
        let mut lb = LoadBalancer::new();
        lb.attach(PipeId(1));
        lb.attach(PipeId(2));

        // Advance the cursor onto the last slot, then remove a pipe.
        assert!(lb.send(|_| true));
        lb.terminated(PipeId(2));

        let mut seen = Vec::new();
        assert!(lb.send(|p| {
            seen.push(p.0);
            true
        }));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_terminated_unknown_pipe_is_noop() {
        let mut lb = LoadBalancer::new();
        lb.attach(PipeId(1));
        lb.terminated(PipeId(9));
        assert_eq!(lb.len(), 1);
    }
}
