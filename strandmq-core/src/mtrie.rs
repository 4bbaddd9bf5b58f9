//! Multi-subscriber prefix trie.
//!
//! As `Trie`, but every registration is attributed to a pipe, with a
//! per-pipe count so duplicate subscribes from the same peer stay
//! idempotent. XPUB uses this to compute the matching-pipe set per
//! publish and to detect first-subscriber / last-unsubscriber
//! transitions, which gate forwarding of subscription changes.

use bytes::Bytes;
use hashbrown::HashMap;

use crate::pipe::PipeId;

/// Prefix trie attributing each registration to a subscribing pipe.
#[derive(Debug, Default)]
pub struct MultiTrie {
    /// Subscription counts for this exact prefix, per pipe.
    pipes: HashMap<PipeId, u32>,
    min: u8,
    count: usize,
    live_nodes: usize,
    next: Vec<Option<Box<MultiTrie>>>,
}

impl MultiTrie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_redundant(&self) -> bool {
        self.pipes.is_empty() && self.live_nodes == 0
    }

    /// Register `prefix` for `pipe`.
    ///
    /// Returns `true` only if this prefix had no subscribers at all
    /// before this call (0 → 1 overall), regardless of which pipe.
    pub fn add(&mut self, prefix: &[u8], pipe: PipeId) -> bool {
        let Some((&byte, rest)) = prefix.split_first() else {
            let unique = self.pipes.is_empty();
            *self.pipes.entry(pipe).or_insert(0) += 1;
            return unique;
        };

        if self.count == 0 || byte < self.min || byte as usize >= self.min as usize + self.count {
            if self.count == 0 {
                self.min = byte;
                self.count = 1;
                self.next = vec![None];
            } else if byte > self.min {
                self.count = (byte - self.min) as usize + 1;
                self.next.resize_with(self.count, || None);
            } else {
                let grow = (self.min - byte) as usize;
                self.count += grow;
                let mut table: Vec<Option<Box<MultiTrie>>> = Vec::with_capacity(self.count);
                table.resize_with(grow, || None);
                table.append(&mut self.next);
                self.next = table;
                self.min = byte;
            }
        }

        let slot = (byte - self.min) as usize;
        if self.next[slot].is_none() {
            self.next[slot] = Some(Box::new(MultiTrie::new()));
            self.live_nodes += 1;
        }

        self.next[slot]
            .as_mut()
            .map_or(false, |node| node.add(rest, pipe))
    }

    /// Unregister one `prefix` registration held by `pipe`.
    ///
    /// Returns `true` only if the prefix is left with no subscribers at
    /// all (1 → 0 overall). Removing a registration the pipe does not
    /// hold returns `false`.
    pub fn remove(&mut self, prefix: &[u8], pipe: PipeId) -> bool {
        let Some((&byte, rest)) = prefix.split_first() else {
            let Some(count) = self.pipes.get_mut(&pipe) else {
                return false;
            };
            *count -= 1;
            if *count == 0 {
                self.pipes.remove(&pipe);
            }
            return self.pipes.is_empty();
        };

        if self.count == 0 || byte < self.min || byte as usize >= self.min as usize + self.count {
            return false;
        }

        let slot = (byte - self.min) as usize;
        let Some(node) = self.next[slot].as_mut() else {
            return false;
        };

        let was_last = node.remove(rest, pipe);

        if node.is_redundant() {
            self.next[slot] = None;
            self.live_nodes -= 1;
            self.compact_table();
        }

        was_last
    }

    /// Invoke `matched` for every pipe subscribed along any prefix of
    /// `topic` (not just the longest). A pipe subscribed to several
    /// matching prefixes is reported once per matched node; callers like
    /// `Distribution::matched` are idempotent, so no deduplication is
    /// performed here.
    pub fn match_topic(&self, topic: &[u8], mut matched: impl FnMut(PipeId)) {
        let mut current = self;
        let mut data = topic;

        loop {
            for pipe in current.pipes.keys() {
                matched(*pipe);
            }

            let Some((&byte, rest)) = data.split_first() else {
                return;
            };

            if current.count == 0
                || byte < current.min
                || byte as usize >= current.min as usize + current.count
            {
                return;
            }

            match current.next[(byte - current.min) as usize].as_deref() {
                Some(node) => current = node,
                None => return,
            }
            data = rest;
        }
    }

    /// True if any pipe is subscribed to some prefix of `data`.
    #[must_use]
    pub fn check(&self, data: &[u8]) -> bool {
        let mut hit = false;
        self.match_topic(data, |_| hit = true);
        hit
    }

    /// Remove every registration held by `pipe` across the whole trie.
    ///
    /// Invokes `last_removed` with the prefix bytes whenever the removal
    /// left that prefix with no subscribers at all; XPUB turns these into
    /// synthetic unsubscribe notifications on disconnect.
    pub fn remove_pipe(&mut self, pipe: PipeId, mut last_removed: impl FnMut(&[u8])) {
        let mut buffer = Vec::new();
        self.remove_pipe_inner(pipe, &mut buffer, &mut last_removed);
    }

    fn remove_pipe_inner(
        &mut self,
        pipe: PipeId,
        buffer: &mut Vec<u8>,
        last_removed: &mut impl FnMut(&[u8]),
    ) {
        if self.pipes.remove(&pipe).is_some() && self.pipes.is_empty() {
            last_removed(buffer);
        }

        let mut pruned = false;
        for i in 0..self.next.len() {
            let byte = (self.min as usize + i) as u8;
            let Some(child) = self.next[i].as_mut() else {
                continue;
            };

            buffer.push(byte);
            child.remove_pipe_inner(pipe, buffer, last_removed);
            buffer.pop();

            if child.is_redundant() {
                self.next[i] = None;
                self.live_nodes -= 1;
                pruned = true;
            }
        }

        if pruned {
            self.compact_table();
        }
    }

    /// Trim dead slots from both edges of the child table.
    fn compact_table(&mut self) {
        if self.live_nodes == 0 {
            self.next.clear();
            self.count = 0;
            self.min = 0;
            return;
        }

        if let Some(last) = self.next.iter().rposition(Option::is_some) {
            self.next.truncate(last + 1);
            self.count = last + 1;
        }
        if let Some(first) = self.next.iter().position(Option::is_some) {
            self.next.drain(..first);
            self.count -= first;
            self.min = (self.min as usize + first) as u8;
        }
    }

    /// Collect every prefix that has at least one subscriber.
    #[must_use]
    pub fn prefixes(&self) -> Vec<Bytes> {
        let mut out = Vec::new();
        let mut buffer = Vec::new();
        self.collect_inner(&mut buffer, &mut out);
        out
    }

    fn collect_inner(&self, buffer: &mut Vec<u8>, out: &mut Vec<Bytes>) {
        if !self.pipes.is_empty() {
            out.push(Bytes::copy_from_slice(buffer));
        }
        for (i, child) in self.next.iter().enumerate() {
            if let Some(child) = child {
                buffer.push((self.min as usize + i) as u8);
                child.collect_inner(buffer, out);
                buffer.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(trie: &MultiTrie, topic: &[u8]) -> Vec<u64> {
        let mut out = Vec::new();
        trie.match_topic(topic, |p| out.push(p.0));
        out.sort_unstable();
        out.dedup();
        out
    }

    #[test]
    fn test_uniqueness_transitions() {
        let mut trie = MultiTrie::new();
        assert!(trie.add(b"A", PipeId(1))); // 0 -> 1: unique
        assert!(!trie.add(b"A", PipeId(2))); // second subscriber
        assert!(!trie.remove(b"A", PipeId(1))); // one subscriber left
        assert!(trie.remove(b"A", PipeId(2))); // 1 -> 0: unique
    }

    #[test]
    fn test_remaining_pipe_still_matches() {
        let mut trie = MultiTrie::new();
        trie.add(b"A", PipeId(1));
        trie.add(b"A", PipeId(2));
        trie.remove(b"A", PipeId(1));

        assert!(trie.check(b"AAA"));
        assert_eq!(matches(&trie, b"AAA"), vec![2]);
    }

    #[test]
    fn test_duplicate_subscribe_is_counted() {
        let mut trie = MultiTrie::new();
        trie.add(b"T", PipeId(1));
        trie.add(b"T", PipeId(1));

        assert!(!trie.remove(b"T", PipeId(1))); // still one registration
        assert!(trie.check(b"T"));
        assert!(trie.remove(b"T", PipeId(1)));
        assert!(!trie.check(b"T"));
    }

    #[test]
    fn test_match_walks_all_prefixes() {
        let mut trie = MultiTrie::new();
        trie.add(b"a", PipeId(1));
        trie.add(b"ab", PipeId(2));
        trie.add(b"abc", PipeId(3));
        trie.add(b"x", PipeId(4));

        assert_eq!(matches(&trie, b"abz"), vec![1, 2]);
        assert_eq!(matches(&trie, b"abc"), vec![1, 2, 3]);
        assert_eq!(matches(&trie, b"b"), Vec::<u64>::new());
    }

    #[test]
    fn test_empty_prefix_matches_all_topics() {
        let mut trie = MultiTrie::new();
        trie.add(b"", PipeId(7));
        assert_eq!(matches(&trie, b"anything"), vec![7]);
    }

    #[test]
    fn test_remove_unknown_pipe_returns_false() {
        let mut trie = MultiTrie::new();
        trie.add(b"A", PipeId(1));
        assert!(!trie.remove(b"A", PipeId(9)));
        assert!(trie.check(b"A"));
    }

    #[test]
    fn test_remove_pipe_reports_emptied_prefixes() {
        let mut trie = MultiTrie::new();
        trie.add(b"solo", PipeId(1));
        trie.add(b"shared", PipeId(1));
        trie.add(b"shared", PipeId(2));

        let mut emptied = Vec::new();
        trie.remove_pipe(PipeId(1), |p| emptied.push(p.to_vec()));

        // Only the prefix with no remaining subscribers is reported.
        assert_eq!(emptied, vec![b"solo".to_vec()]);
        assert!(trie.check(b"shared"));
        assert!(!trie.check(b"solo"));
    }

    #[test]
    fn test_remove_pipe_prunes_structure() {
        let mut trie = MultiTrie::new();
        trie.add(b"abc", PipeId(1));
        trie.add(b"abd", PipeId(1));

        trie.remove_pipe(PipeId(1), |_| {});
        assert!(trie.is_redundant());
        assert!(trie.prefixes().is_empty());
    }
}
