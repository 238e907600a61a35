//! DFS iteration over one trie's right-side patterns (§4.5).

use super::Container;
use crate::cell::{CellIndex, CellKind};
use alloc::borrow::Cow;
use alloc::vec::Vec;

/// One pending sibling to resume once the current path is exhausted: the
/// `OR` target and how much of the scratch buffer to roll back to before
/// resuming it.
#[derive(Debug, Clone, Copy)]
struct ForkPoint {
    cell: CellIndex,
    scratch_len: usize,
}

/// Yields each pattern's right-side bytes exactly once, decoded lossily as
/// UTF-8. Built by [`super::TrieHandle::iter`].
pub struct Iter<'c> {
    container: &'c Container,
    /// Cell to visit next, or `0` once the fork stack is also empty.
    cursor: CellIndex,
    forks: Vec<ForkPoint>,
    scratch: Vec<u8>,
}

impl<'c> Iter<'c> {
    pub(crate) fn new(container: &'c Container, root: CellIndex) -> Iter<'c> {
        Iter {
            container,
            cursor: root,
            forks: Vec::new(),
            scratch: Vec::with_capacity(256),
        }
    }

    fn pop_fork(&mut self) -> bool {
        match self.forks.pop() {
            Some(ForkPoint { cell, scratch_len }) => {
                self.scratch.truncate(scratch_len);
                self.cursor = cell;
                true
            }
            None => {
                self.cursor = 0;
                false
            }
        }
    }
}

impl<'c> Iterator for Iter<'c> {
    type Item = Cow<'c, str>;

    fn next(&mut self) -> Option<Cow<'c, str>> {
        let buf = self.container.buffer();
        loop {
            if self.cursor == 0 {
                return None;
            }
            match CellKind::from_word2(buf.read_word(self.cursor, 2)) {
                CellKind::Segment { length, char_offset } => {
                    let or = buf.read_word(self.cursor, 1);
                    if or != 0 {
                        self.forks.push(ForkPoint {
                            cell: or,
                            scratch_len: self.scratch.len(),
                        });
                    }
                    let bytes = buf.bytes(buf.char0() + char_offset, length as u32);
                    self.scratch.extend_from_slice(bytes);
                    let and = buf.read_word(self.cursor, 0);
                    if and == 0 {
                        // Dead end with no boundary spliced in yet; back out
                        // to the next fork (or stop).
                        if !self.pop_fork() {
                            return None;
                        }
                        continue;
                    }
                    self.cursor = and;
                }
                CellKind::Boundary { .. } => {
                    let value = Cow::Owned(crate::intern::decode_lossy(self.scratch.as_slice()));
                    let next_and = buf.read_word(self.cursor, 0);
                    if next_and == 0 {
                        if !self.pop_fork() {
                            // leave cursor at 0 so the *next* call returns None
                            self.cursor = 0;
                        }
                    } else {
                        self.cursor = next_and;
                    }
                    return Some(value);
                }
            }
        }
    }
}

impl<'c> core::iter::FusedIterator for Iter<'c> {}

impl<'c> core::fmt::Debug for Iter<'c> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Iter")
            .field("cursor", &self.cursor)
            .field("forks", &self.forks.len())
            .finish()
    }
}
