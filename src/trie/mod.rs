//! The two mutually recursive walks at the heart of this crate:
//! [`Container::add`]/`add_left` for insertion, [`Container::matches`]/
//! `matches_left` for lookup, plus the [`TrieHandle`] that threads a
//! `(container, trie)` pair through a single ergonomic API.
//!
//! A trie *root* is just another cell index; several independent tries can
//! live in one [`Container`], each tracked by its own [`Trie`] value.

pub mod iter;

use crate::buffer::Buffer;
use crate::cell::{pack_segment_info, CellIndex, CellKind, BCELL_EXTRA_MAX, EXTRA_ACCEPT_ALWAYS};
use crate::config::{BidiTrieConfig, ExtraHandler};
use crate::intern::store_string;
use crate::search::PortableSearch;
#[cfg(feature = "simd")]
use crate::search::{AcceleratedSearch, SearchOps};

pub use iter::Iter;

/// The outcome of a successful [`Container::matches`]/`matches_left` call,
/// returned by value rather than stashed on the container (§9 of the design:
/// this is what lets `matches` take `&self` and run from multiple readers at
/// once with no synchronization).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchInfo {
    /// Leftmost matched haystack index.
    pub l: usize,
    /// One-past-right matched haystack index.
    pub r: usize,
    /// `None` for an unconditional (`EXTRA == 1`) terminal; `Some(handle)`
    /// for the non-zero value returned by the extra handler.
    pub extra: Option<u32>,
}

/// A lightweight handle to one trie's root cell inside a [`Container`].
/// Plain data — no reference to the container it belongs to, so several
/// `Trie`s backed by the same container can be held side by side.
#[derive(Debug, Clone, Copy)]
pub struct Trie {
    root: CellIndex,
    len: u32,
}

impl Trie {
    /// The root cell index, for callers that want to drive
    /// [`Container::matches`] directly without going through a [`TrieHandle`].
    pub fn root(&self) -> CellIndex {
        self.root
    }

    /// Number of patterns inserted into this trie.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// String search implementation selected at construction time.
#[derive(Debug, Clone, Copy)]
enum SearchImpl {
    Portable,
    #[cfg(feature = "simd")]
    Accelerated,
}

impl SearchImpl {
    #[cfg(feature = "simd")]
    fn select(config: &BidiTrieConfig) -> SearchImpl {
        if config.accelerated_search {
            SearchImpl::Accelerated
        } else {
            SearchImpl::Portable
        }
    }

    #[cfg(not(feature = "simd"))]
    fn select(_config: &BidiTrieConfig) -> SearchImpl {
        SearchImpl::Portable
    }

    fn starts_with(self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> bool {
        match self {
            SearchImpl::Portable => PortableSearch.starts_with(buf, hl, hr, nl, n_len),
            #[cfg(feature = "simd")]
            SearchImpl::Accelerated => AcceleratedSearch.starts_with(buf, hl, hr, nl, n_len),
        }
    }
}

/// Owns the backing [`Buffer`] and the optional extra-handler predicate;
/// every trie stored in it addresses cells by plain `u32` index.
pub struct Container {
    buf: Buffer,
    extra_handler: Option<ExtraHandler>,
    search: SearchImpl,
}

impl core::fmt::Debug for Container {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Container")
            .field("buf", &self.buf)
            .field("search", &self.search)
            .field("has_extra_handler", &self.extra_handler.is_some())
            .finish()
    }
}

impl Container {
    /// Builds a container from `config`, consuming it.
    pub fn with_config(mut config: BidiTrieConfig) -> Container {
        let search = SearchImpl::select(&config);
        let extra_handler = config.extra_handler.take();
        let buf = Buffer::new(&config);
        Container {
            buf,
            extra_handler,
            search,
        }
    }

    /// Allocates a fresh, empty trie backed by this container.
    pub fn new_trie(&mut self) -> Trie {
        let root = self.alloc_cell();
        Trie { root, len: 0 }
    }

    /// A handle bundling this container with one of its tries, exposing the
    /// add/match/iterate surface described by §4.8 of the design.
    pub fn handle<'c>(&'c mut self, trie: &'c mut Trie) -> TrieHandle<'c> {
        TrieHandle {
            container: self,
            trie,
        }
    }

    /// Writes `haystack` into the shared window, truncating (with a
    /// `log::warn!`, since haystack content is untrusted external input
    /// rather than a programmer error) to the 2048-byte window if it
    /// overflows.
    pub fn set_haystack(&mut self, haystack: &[u8]) {
        let window = self.buf.haystack_window_mut();
        let len = if haystack.len() > window.len() {
            log::warn!(
                "bidi-trie: haystack of {} bytes truncated to {}-byte window",
                haystack.len(),
                window.len()
            );
            window.len()
        } else {
            haystack.len()
        };
        window[..len].copy_from_slice(&haystack[..len]);
        self.buf.set_haystack_len(len as u32);
    }

    /// Interns `bytes` for later use as a pattern's character data, returning
    /// the offset `add` expects as `interning_offset`.
    pub fn store_pattern(&mut self, bytes: &[u8]) -> u32 {
        store_string(&mut self.buf, bytes)
    }

    pub fn reset(&mut self) {
        self.buf.reset();
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buf
    }

    /// Shrinks the backing buffer to fit its current contents.
    pub fn optimize(&mut self) {
        self.buf.shrink_buf();
    }

    /// Exposes the live buffer (truncated to used length) as a byte image.
    pub fn serialize(&self) -> alloc::vec::Vec<u8> {
        crate::serialize::serialize(&self.buf)
    }

    /// Restores this container's buffer from a previously `serialize`d
    /// image. Trie root indices obtained before this call remain valid word
    /// indices into the restored buffer as long as they name cells that were
    /// part of the serialized image.
    pub fn deserialize(&mut self, image: &[u8]) -> Result<(), crate::error::BidiTrieError> {
        crate::serialize::deserialize(&mut self.buf, image)
    }

    // -- cell helpers --------------------------------------------------

    fn alloc_cell(&mut self) -> CellIndex {
        self.buf.grow_buf(crate::cell::CELL_BYTES, 0);
        self.buf.allocate_cell()
    }

    fn pattern_byte(&self, interning_offset: u32, pos: u32) -> u8 {
        self.buf.byte(self.buf.char0() + interning_offset + pos)
    }

    fn write_segment(&mut self, cell: CellIndex, interning_offset: u32, lo: u32, hi: u32) {
        debug_assert!(hi > lo, "segment must be non-empty");
        let info = pack_segment_info((hi - lo) as u8, interning_offset + lo);
        self.buf.write_word(cell, 2, info);
    }

    fn alloc_segment_cell(&mut self, interning_offset: u32, lo: u32, hi: u32) -> CellIndex {
        let cell = self.alloc_cell();
        self.write_segment(cell, interning_offset, lo, hi);
        cell
    }

    /// §4.3's "boundary cell placement rule": ensures `cell`'s `AND`/
    /// `NEXT_AND` slot (word 0) names a boundary cell, allocating and
    /// splicing one in if it currently names nothing or a segment cell.
    fn ensure_boundary(&mut self, cell: CellIndex) -> CellIndex {
        let and = self.buf.read_word(cell, 0);
        if and == 0 {
            return self.splice_boundary(cell, 0);
        }
        match CellKind::from_word2(self.buf.read_word(and, 2)) {
            CellKind::Segment { .. } => self.splice_boundary(cell, and),
            CellKind::Boundary { .. } => and,
        }
    }

    fn splice_boundary(&mut self, cell: CellIndex, old_and: CellIndex) -> CellIndex {
        let boundary = self.alloc_cell();
        self.buf.write_word(boundary, 0, old_and);
        self.buf.write_word(cell, 0, boundary);
        boundary
    }

    fn ensure_left_root(&mut self, boundary: CellIndex) -> CellIndex {
        let alt = self.buf.read_word(boundary, 1);
        if alt != 0 {
            return alt;
        }
        let root = self.alloc_cell();
        self.buf.write_word(boundary, 1, root);
        root
    }

    /// Reads a boundary cell's `EXTRA` (word 2).
    pub fn get_extra(&self, boundary: CellIndex) -> u32 {
        self.buf.read_word(boundary, 2)
    }

    /// Sets a boundary cell's `EXTRA` (word 2). `value` must be
    /// `<= BCELL_EXTRA_MAX`.
    pub fn set_extra(&mut self, boundary: CellIndex, value: u32) {
        debug_assert!(
            value <= BCELL_EXTRA_MAX,
            "extra value {value} does not fit a boundary cell"
        );
        self.buf.write_word(boundary, 2, value);
    }

    // -- insertion -------------------------------------------------------

    /// Inserts the pattern occupying `[interning_offset, interning_offset +
    /// total_len)` of the character region, splitting it at `pivot` into a
    /// right part walked from `root` and (if `pivot > 0`) a left part walked
    /// from the resulting boundary's `ALT_AND`. Returns the boundary cell the
    /// caller should annotate with `set_extra`.
    ///
    /// # Correctness
    ///
    /// `pivot <= total_len` and `pivot < total_len` (every stored pattern has
    /// a non-empty right part); `total_len <= 255`.
    pub fn add(&mut self, root: CellIndex, interning_offset: u32, total_len: u32, pivot: u32) -> CellIndex {
        debug_assert!(pivot <= total_len);
        debug_assert!(
            pivot < total_len,
            "bidi-trie patterns must have a non-empty right part"
        );
        self.insert_right(root, interning_offset, total_len, pivot)
    }

    fn insert_right(&mut self, root: CellIndex, interning_offset: u32, total_len: u32, pivot: u32) -> CellIndex {
        if self.buf.read_word(root, 2) == 0 {
            self.write_segment(root, interning_offset, pivot, total_len);
            return self.add_left(root, interning_offset, pivot);
        }

        let mut icell = root;
        let mut al = pivot;
        loop {
            match CellKind::from_word2(self.buf.read_word(icell, 2)) {
                CellKind::Boundary { .. } => {
                    let next = self.buf.read_word(icell, 0);
                    if next == 0 {
                        let new_cell = self.alloc_segment_cell(interning_offset, al, total_len);
                        self.buf.write_word(icell, 0, new_cell);
                        return self.add_left(new_cell, interning_offset, pivot);
                    }
                    icell = next;
                }
                CellKind::Segment { length, char_offset } => {
                    let seg_base = self.buf.char0() + char_offset;
                    if self.buf.byte(seg_base) != self.pattern_byte(interning_offset, al) {
                        let or = self.buf.read_word(icell, 1);
                        if or == 0 {
                            let new_cell = self.alloc_segment_cell(interning_offset, al, total_len);
                            self.buf.write_word(icell, 1, new_cell);
                            return self.add_left(new_cell, interning_offset, pivot);
                        }
                        icell = or;
                        continue;
                    }

                    let length = length as u32;
                    let remaining = total_len - al;
                    let mut bi = 1u32;
                    while bi < length && bi < remaining {
                        if self.buf.byte(seg_base + bi) != self.pattern_byte(interning_offset, al + bi) {
                            break;
                        }
                        bi += 1;
                    }

                    if bi == length {
                        al += bi;
                        if al == total_len {
                            return self.add_left(icell, interning_offset, pivot);
                        }
                        let and = self.buf.read_word(icell, 0);
                        if and != 0 {
                            icell = and;
                            continue;
                        }
                        let new_cell = self.alloc_segment_cell(interning_offset, al, total_len);
                        self.buf.write_word(icell, 0, new_cell);
                        return self.add_left(new_cell, interning_offset, pivot);
                    }

                    // Partial match: split at `bi`. The shortened head keeps
                    // referencing the *original* segment's bytes (offset `0`
                    // is the "already absolute" base, matching the tail write
                    // below and the `insert_left` mirror), not the pattern
                    // currently being inserted.
                    let old_and = self.buf.read_word(icell, 0);
                    self.write_segment(icell, 0, char_offset, char_offset + bi);
                    let tail = self.alloc_cell();
                    self.buf.write_word(tail, 0, old_and);
                    self.write_segment(tail, 0, char_offset + bi, char_offset + length);
                    self.buf.write_word(icell, 0, tail);

                    if bi == remaining {
                        return self.add_left(icell, interning_offset, pivot);
                    }
                    let rest = self.alloc_segment_cell(interning_offset, al + bi, total_len);
                    self.buf.write_word(tail, 1, rest);
                    return self.add_left(rest, interning_offset, pivot);
                }
            }
        }
    }

    fn add_left(&mut self, right_cell: CellIndex, interning_offset: u32, pivot: u32) -> CellIndex {
        let boundary = self.ensure_boundary(right_cell);
        if pivot == 0 {
            return boundary;
        }
        if self.buf.read_word(boundary, 2) == EXTRA_ACCEPT_ALWAYS {
            // An unconditional accept already sits here; it dominates any
            // more specific left-qualified match, so there's nothing to add.
            return boundary;
        }
        let alt_root = self.ensure_left_root(boundary);
        self.insert_left(alt_root, interning_offset, pivot)
    }

    /// Mirror of `insert_right`: walks `[0, pivot)` tail-first (from
    /// position `pivot - 1` down to `0`). Segments always span `[far_start,
    /// bl)` of the pattern (`far_start == 0` for a freshly written "whole
    /// remainder" segment, nonzero only for the near-pivot half produced by
    /// a split), and are compared starting from their *last* stored byte.
    fn insert_left(&mut self, root: CellIndex, interning_offset: u32, pivot: u32) -> CellIndex {
        if self.buf.read_word(root, 2) == 0 {
            self.write_segment(root, interning_offset, 0, pivot);
            return self.ensure_boundary(root);
        }

        let mut icell = root;
        let mut bl = pivot;
        loop {
            match CellKind::from_word2(self.buf.read_word(icell, 2)) {
                CellKind::Boundary { .. } => {
                    let next = self.buf.read_word(icell, 0);
                    if next == 0 {
                        let new_cell = self.alloc_segment_cell(interning_offset, 0, bl);
                        self.buf.write_word(icell, 0, new_cell);
                        return self.ensure_boundary(new_cell);
                    }
                    icell = next;
                }
                CellKind::Segment { length, char_offset } => {
                    let length = length as u32;
                    let seg_last = self.buf.char0() + char_offset + length - 1;
                    if self.buf.byte(seg_last) != self.pattern_byte(interning_offset, bl - 1) {
                        let or = self.buf.read_word(icell, 1);
                        if or == 0 {
                            let new_cell = self.alloc_segment_cell(interning_offset, 0, bl);
                            self.buf.write_word(icell, 1, new_cell);
                            return self.ensure_boundary(new_cell);
                        }
                        icell = or;
                        continue;
                    }

                    let mut bi = 1u32;
                    while bi < length && bi < bl {
                        let seg_byte = self.buf.byte(self.buf.char0() + char_offset + length - 1 - bi);
                        let pat_byte = self.pattern_byte(interning_offset, bl - 1 - bi);
                        if seg_byte != pat_byte {
                            break;
                        }
                        bi += 1;
                    }

                    if bi == length {
                        bl -= bi;
                        if bl == 0 {
                            return self.ensure_boundary(icell);
                        }
                        let and = self.buf.read_word(icell, 0);
                        if and != 0 {
                            icell = and;
                            continue;
                        }
                        let new_cell = self.alloc_segment_cell(interning_offset, 0, bl);
                        self.buf.write_word(icell, 0, new_cell);
                        return self.ensure_boundary(new_cell);
                    }

                    // Partial match: the nearest-pivot `bi` bytes matched;
                    // shorten `icell` to that tail, split the far remainder
                    // into a new cell inheriting the old continuation.
                    let old_and = self.buf.read_word(icell, 0);
                    let matched_offset = char_offset + (length - bi);
                    self.write_segment(icell, 0, matched_offset, matched_offset + bi);
                    let tail_len = length - bi;
                    let tail = self.alloc_cell();
                    self.buf.write_word(tail, 0, old_and);
                    if tail_len > 0 {
                        self.write_segment(tail, 0, char_offset, char_offset + tail_len);
                    }
                    self.buf.write_word(icell, 0, tail);

                    bl -= bi;
                    if bl == 0 {
                        return self.ensure_boundary(icell);
                    }
                    let rest = self.alloc_segment_cell(interning_offset, 0, bl);
                    self.buf.write_word(tail, 1, rest);
                    return self.ensure_boundary(rest);
                }
            }
        }
    }

    // -- matching ----------------------------------------------------------

    /// Tests whether some stored pattern's pivot aligns at haystack position
    /// `i`. See §4.4 for the full algorithm.
    pub fn matches(&self, root: CellIndex, i: usize) -> Option<MatchInfo> {
        let haystack_len = self.buf.haystack_len() as usize;
        let mut icell = root;
        let mut al = i as u32;
        loop {
            if al as usize >= haystack_len {
                return None;
            }
            // Walk the OR chain for a segment whose full text matches here.
            loop {
                match CellKind::from_word2(self.buf.read_word(icell, 2)) {
                    CellKind::Segment { length, char_offset } => {
                        let length = length as u32;
                        if self.starts_with(al, haystack_len as u32, char_offset, length) {
                            al += length;
                            break;
                        }
                        let or = self.buf.read_word(icell, 1);
                        if or == 0 {
                            return None;
                        }
                        icell = or;
                    }
                    CellKind::Boundary { .. } => {
                        // Can only happen if `root` itself is a not-yet-populated
                        // boundary cell (an empty trie); nothing matches.
                        return None;
                    }
                }
            }

            // `icell` is now a matched segment cell. Its `AND` may name
            // another segment cell directly — a split (§4.3 step 8) can
            // chain two patterns' divergent tails off a shared head with no
            // boundary in between — so the target must be classified rather
            // than assumed to be a boundary.
            let and_target = self.buf.read_word(icell, 0);
            if and_target == 0 {
                return None;
            }
            match CellKind::from_word2(self.buf.read_word(and_target, 2)) {
                CellKind::Segment { .. } => {
                    icell = and_target;
                    continue;
                }
                CellKind::Boundary { .. } => {
                    let boundary = and_target;
                    let extra = self.buf.read_word(boundary, 2);
                    if extra != 0 {
                        if let Some(handle) = self.accept(i, al as usize, extra) {
                            return Some(MatchInfo {
                                l: i,
                                r: al as usize,
                                extra: handle,
                            });
                        }
                    }
                    let alt_and = self.buf.read_word(boundary, 1);
                    if alt_and != 0 {
                        if let Some(info) = self.matches_left(alt_and, i, al as usize) {
                            return Some(info);
                        }
                    }
                    let next_and = self.buf.read_word(boundary, 0);
                    if next_and == 0 {
                        return None;
                    }
                    icell = next_and;
                }
            }
        }
    }

    /// Mirror of `matches`: walks `[left_bound, right_bound)` tail-first.
    fn matches_left(&self, root: CellIndex, left_bound: usize, right_bound: usize) -> Option<MatchInfo> {
        let mut icell = root;
        let mut ar = right_bound as u32;
        loop {
            if (ar as usize) <= left_bound {
                return None;
            }
            let c = self.buf.byte(ar - 1);
            loop {
                match CellKind::from_word2(self.buf.read_word(icell, 2)) {
                    CellKind::Segment { length, char_offset } => {
                        let length = length as u32;
                        let seg_last = self.buf.char0() + char_offset + length - 1;
                        if self.buf.byte(seg_last) == c {
                            if (ar as usize) < left_bound + length as usize {
                                return None;
                            }
                            let matches_rest = (1..length).all(|k| {
                                self.buf.byte(ar - 1 - k) == self.buf.byte(seg_last - k)
                            });
                            if !matches_rest {
                                return None;
                            }
                            ar -= length;
                            break;
                        }
                        let or = self.buf.read_word(icell, 1);
                        if or == 0 {
                            return None;
                        }
                        icell = or;
                    }
                    CellKind::Boundary { .. } => return None,
                }
            }

            // As in `matches`: a matched segment's `AND` may chain directly
            // to another segment cell rather than a boundary.
            let and_target = self.buf.read_word(icell, 0);
            if and_target == 0 {
                return None;
            }
            match CellKind::from_word2(self.buf.read_word(and_target, 2)) {
                CellKind::Segment { .. } => {
                    icell = and_target;
                    continue;
                }
                CellKind::Boundary { .. } => {
                    let boundary = and_target;
                    let extra = self.buf.read_word(boundary, 2);
                    if extra != 0 {
                        if let Some(handle) = self.accept(ar as usize, right_bound, extra) {
                            return Some(MatchInfo {
                                l: ar as usize,
                                r: right_bound,
                                extra: handle,
                            });
                        }
                    }
                    let next_and = self.buf.read_word(boundary, 0);
                    if next_and == 0 {
                        return None;
                    }
                    icell = next_and;
                }
            }
        }
    }

    /// `EXTRA == 1` always accepts with no handle; anything else is gated by
    /// the caller-supplied predicate.
    ///
    /// # Correctness
    ///
    /// An `extra_handler` must be configured if any stored pattern has
    /// `EXTRA > 1`.
    fn accept(&self, l: usize, r: usize, extra: u32) -> Option<Option<u32>> {
        if extra == EXTRA_ACCEPT_ALWAYS {
            return Some(None);
        }
        debug_assert!(
            self.extra_handler.is_some(),
            "boundary cell has EXTRA {extra} but no extra_handler is configured"
        );
        let handler = self.extra_handler.as_ref()?;
        let handle = handler(l, r, extra);
        if handle == 0 {
            None
        } else {
            Some(Some(handle))
        }
    }

    fn starts_with(&self, hl: u32, hr: u32, nl: u32, n_len: u32) -> bool {
        self.search.starts_with(&self.buf, hl, hr, nl, n_len)
    }
}

/// Bundles a [`Container`] with one of its [`Trie`]s, exposing the surface
/// described by §4.8: add, get/set extra, matches, iterate, len.
#[derive(Debug)]
pub struct TrieHandle<'c> {
    container: &'c mut Container,
    trie: &'c mut Trie,
}

impl<'c> TrieHandle<'c> {
    /// Stores `left ++ right` (pivot at `left.len()`) and inserts it.
    /// Returns the boundary cell the caller should `set_extra` on.
    ///
    /// # Correctness
    ///
    /// `left.len() + right.len() <= 255`.
    pub fn add(&mut self, left: &[u8], right: &[u8]) -> CellIndex {
        debug_assert!(
            left.len() + right.len() <= crate::cell::MAX_SEGMENT_LEN,
            "pattern of {} bytes exceeds the {}-byte limit",
            left.len() + right.len(),
            crate::cell::MAX_SEGMENT_LEN
        );
        let mut bytes = alloc::vec::Vec::with_capacity(left.len() + right.len());
        bytes.extend_from_slice(left);
        bytes.extend_from_slice(right);
        let offset = self.container.store_pattern(&bytes);
        let total_len = bytes.len() as u32;
        let pivot = left.len() as u32;
        let boundary = self.container.add(self.trie.root, offset, total_len, pivot);
        self.trie.len += 1;
        boundary
    }

    pub fn get_extra(&self, boundary: CellIndex) -> u32 {
        self.container.get_extra(boundary)
    }

    pub fn set_extra(&mut self, boundary: CellIndex, value: u32) {
        self.container.set_extra(boundary, value)
    }

    pub fn matches(&self, i: usize) -> Option<MatchInfo> {
        self.container.matches(self.trie.root, i)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.container, self.trie.root)
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn container() -> Container {
        Container::with_config(BidiTrieConfig::new().page_size(4096))
    }

    #[test]
    fn insert_and_match_no_left_part() {
        let mut c = container();
        let mut trie = c.new_trie();
        let boundary = {
            let mut h = c.handle(&mut trie);
            let b = h.add(b"", b"ad");
            h.set_extra(b, EXTRA_ACCEPT_ALWAYS);
            b
        };
        assert_ne!(boundary, 0);
        c.set_haystack(b"ad");
        assert_eq!(
            c.matches(trie.root, 0),
            Some(MatchInfo {
                l: 0,
                r: 2,
                extra: None
            })
        );
        assert_eq!(c.matches(trie.root, 1), None);
    }

    #[test]
    fn insert_and_match_with_left_part() {
        let mut c = container();
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let b = h.add(b"-images/", b"ad-");
            h.set_extra(b, EXTRA_ACCEPT_ALWAYS);
        }
        c.set_haystack(b"http://x/-images/ad-banner");
        let pivot = b"http://x/-images/".len();
        let info = c.matches(trie.root, pivot).expect("expected a match");
        assert_eq!(info.l, b"http://x/".len());
        assert_eq!(info.r, b"http://x/-images/ad-".len());
    }

    #[test]
    fn shared_right_prefix_branches_on_left() {
        let mut c = container();
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let b1 = h.add(b"/google_", b"ad.");
            h.set_extra(b1, EXTRA_ACCEPT_ALWAYS);
            let b2 = h.add(b"/images_", b"ad.");
            h.set_extra(b2, EXTRA_ACCEPT_ALWAYS);
        }
        c.set_haystack(b"/images_ad.gif");
        let pivot = b"/images_".len();
        let info = c.matches(trie.root, pivot).expect("expected a match");
        assert_eq!(info.l, 0);
        assert_eq!(info.r, b"/images_ad.".len());
    }

    #[test]
    fn shared_segment_prefix_on_the_right_side() {
        // "ad-banner" and "ad-count" share the segment prefix "ad-", which
        // forces insert_right's step-8(b) split: the shared head cell's
        // `AND` chains straight to the tail segment cell holding the
        // divergent continuation, with no boundary cell in between (no
        // pattern ends at "ad-" itself). `matches` must follow that chain
        // rather than mistake the tail segment for a boundary.
        let mut c = container();
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let b1 = h.add(b"", b"ad-banner");
            h.set_extra(b1, EXTRA_ACCEPT_ALWAYS);
            let b2 = h.add(b"", b"ad-count");
            h.set_extra(b2, EXTRA_ACCEPT_ALWAYS);
        }

        c.set_haystack(b"ad-banner");
        let info = c.matches(trie.root, 0).expect("ad-banner should match");
        assert_eq!(info.l, 0);
        assert_eq!(info.r, b"ad-banner".len());

        c.set_haystack(b"ad-count");
        let info = c.matches(trie.root, 0).expect("ad-count should match");
        assert_eq!(info.l, 0);
        assert_eq!(info.r, b"ad-count".len());
    }

    #[test]
    fn reset_clears_all_patterns() {
        let mut c = container();
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let b = h.add(b"-images/", b"ad-");
            h.set_extra(b, EXTRA_ACCEPT_ALWAYS);
        }
        c.reset();
        trie = c.new_trie();
        c.set_haystack(b"http://x/-images/ad-banner");
        let pivot = b"http://x/-images/".len();
        assert_eq!(c.matches(trie.root, pivot), None);
    }

    #[test]
    fn extra_handler_gates_conditional_boundary() {
        let mut c = Container::with_config(
            BidiTrieConfig::new()
                .page_size(4096)
                .extra_handler(|_l, _r, extra_id| if extra_id == 9 { extra_id } else { 0 }),
        );
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let b7 = h.add(b"", b"ad");
            h.set_extra(b7, 7);
        }
        c.set_haystack(b"ad");
        // extra id 7 is rejected by the handler.
        assert_eq!(c.matches(trie.root, 0), None);
    }

    #[test]
    fn later_extra_on_the_same_boundary_wins() {
        // Two patterns sharing identical (left, right) text resolve to the
        // same boundary cell; the second `set_extra` call is the one that
        // sticks, so a handler accepting only extra id 9 must see 9.
        let mut c = Container::with_config(
            BidiTrieConfig::new()
                .page_size(4096)
                .extra_handler(|_l, _r, extra_id| if extra_id == 9 { extra_id } else { 0 }),
        );
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            let first = h.add(b"", b"ad");
            h.set_extra(first, 7);
            let second = h.add(b"", b"ad");
            assert_eq!(first, second, "identical patterns share one boundary cell");
            h.set_extra(second, 9);
        }
        c.set_haystack(b"ad");
        let info = c.matches(trie.root, 0).expect("extra id 9 is accepted");
        assert_eq!(info.extra, Some(9));
    }

    #[test]
    fn iter_yields_every_inserted_right_side() {
        let mut c = container();
        let mut trie = c.new_trie();
        {
            let mut h = c.handle(&mut trie);
            for (l, r) in [(&b""[..], &b"ad"[..]), (b"x", b"ad-banner"), (b"", b"other")] {
                let b = h.add(l, r);
                h.set_extra(b, EXTRA_ACCEPT_ALWAYS);
            }
        }
        let h = c.handle(&mut trie);
        let mut seen: Vec<alloc::string::String> =
            h.iter().map(|s| s.into_owned()).collect();
        seen.sort();
        assert_eq!(seen, ["ad", "ad-banner", "other"]);
    }
}
