//! Byte-prefix subscription trie (single subscriber).
//!
//! Records active subscription prefixes with reference counts. XSUB keeps
//! one of these for the topics it has subscribed to; `check` runs on the
//! receive path for every inbound publish and is allocation-free.
//!
//! Each node holds a sparse child table compacted to the dense range
//! `[min, min + count)` over the next byte, growing on insert outside the
//! range and shrinking from whichever side a removal vacates.

use bytes::Bytes;

/// Prefix set over byte strings with per-prefix reference counts.
#[derive(Debug, Default)]
pub struct Trie {
    refcount: u32,
    min: u8,
    count: usize,
    live_nodes: usize,
    next: Vec<Option<Box<Trie>>>,
}

impl Trie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A node is redundant (prunable) when nothing references it and it
    /// has no live children.
    #[must_use]
    pub fn is_redundant(&self) -> bool {
        self.refcount == 0 && self.live_nodes == 0
    }

    /// Register a prefix.
    ///
    /// Returns `true` only if this was the first registration of this
    /// exact prefix (reference count 0 → 1).
    pub fn add(&mut self, prefix: &[u8]) -> bool {
        let Some((&byte, rest)) = prefix.split_first() else {
            // We are at the node corresponding to the prefix.
            self.refcount += 1;
            return self.refcount == 1;
        };

        if self.count == 0 || byte < self.min || byte as usize >= self.min as usize + self.count {
            // The byte is out of range of the current table; extend it.
            if self.count == 0 {
                self.min = byte;
                self.count = 1;
                self.next = vec![None];
            } else if byte > self.min {
                // The new byte is above the current range.
                self.count = (byte - self.min) as usize + 1;
                self.next.resize_with(self.count, || None);
            } else {
                // The new byte is below the current range.
                let grow = (self.min - byte) as usize;
                self.count += grow;
                let mut table: Vec<Option<Box<Trie>>> = Vec::with_capacity(self.count);
                table.resize_with(grow, || None);
                table.append(&mut self.next);
                self.next = table;
                self.min = byte;
            }
        }

        let slot = (byte - self.min) as usize;
        if self.next[slot].is_none() {
            self.next[slot] = Some(Box::new(Trie::new()));
            self.live_nodes += 1;
        }

        self.next[slot]
            .as_mut()
            .map_or(false, |node| node.add(rest))
    }

    /// Unregister a prefix.
    ///
    /// Returns `true` only if this was the last registration of this
    /// exact prefix (reference count 1 → 0). Removing a prefix that was
    /// never added returns `false`.
    pub fn remove(&mut self, prefix: &[u8]) -> bool {
        let Some((&byte, rest)) = prefix.split_first() else {
            if self.refcount == 0 {
                return false;
            }
            self.refcount -= 1;
            return self.refcount == 0;
        };

        if self.count == 0 || byte < self.min || byte as usize >= self.min as usize + self.count {
            return false;
        }

        let slot = (byte - self.min) as usize;
        let Some(node) = self.next[slot].as_mut() else {
            return false;
        };

        let was_removed = node.remove(rest);

        if node.is_redundant() {
            self.next[slot] = None;
            self.live_nodes -= 1;
            self.compact(byte);
        }

        was_removed
    }

    /// Shrink the child table after the slot for `removed` was vacated.
    fn compact(&mut self, removed: u8) {
        if self.count == 1 {
            self.next.clear();
            self.count = 0;
            self.min = 0;
            debug_assert_eq!(self.live_nodes, 0);
            return;
        }

        if removed == self.min {
            // Compact the table from the left.
            if let Some(first) = self.next.iter().position(Option::is_some) {
                self.next.drain(..first);
                self.count -= first;
                self.min = (self.min as usize + first) as u8;
            }
        } else if removed as usize == self.min as usize + self.count - 1 {
            // Compact the table from the right.
            if let Some(last) = self.next.iter().rposition(Option::is_some) {
                self.next.truncate(last + 1);
                self.count = last + 1;
            }
        }
    }

    /// Longest-available-prefix match.
    ///
    /// Returns `true` as soon as any node along `data` holds a live
    /// registration, so a subscription to `"A"` matches topic `"AAA"`.
    ///
    /// This function is on the critical path of every publish filter; it
    /// deliberately avoids recursion and never allocates.
    #[must_use]
    pub fn check(&self, data: &[u8]) -> bool {
        let mut current = self;
        let mut data = data;

        loop {
            // Found a registered subscription.
            if current.refcount > 0 {
                return true;
            }

            // All bytes consumed without a match.
            let Some((&byte, rest)) = data.split_first() else {
                return false;
            };

            // No slot for the next byte: no match.
            if current.count == 0
                || byte < current.min
                || byte as usize >= current.min as usize + current.count
            {
                return false;
            }

            match current.next[(byte - current.min) as usize].as_deref() {
                Some(node) => current = node,
                None => return false,
            }
            data = rest;
        }
    }

    /// Apply `func` to every registered prefix, depth-first in ascending
    /// byte order (not insertion order).
    pub fn for_each(&self, mut func: impl FnMut(&[u8])) {
        let mut buffer = Vec::new();
        self.for_each_inner(&mut buffer, &mut func);
    }

    fn for_each_inner(&self, buffer: &mut Vec<u8>, func: &mut impl FnMut(&[u8])) {
        if self.refcount > 0 {
            func(buffer);
        }

        for (i, child) in self.next.iter().enumerate() {
            if let Some(child) = child {
                buffer.push((self.min as usize + i) as u8);
                child.for_each_inner(buffer, func);
                buffer.pop();
            }
        }
    }

    /// Collect every registered prefix as owned byte strings.
    #[must_use]
    pub fn prefixes(&self) -> Vec<Bytes> {
        let mut out = Vec::new();
        self.for_each(|prefix| out.push(Bytes::copy_from_slice(prefix)));
        out
    }
}
