//! The single backing byte buffer and its bump allocator.
//!
//! # Layout
//!
//! ```text
//! [ haystack window (2048B) ][ 5 x u32 header ][ trie cells ][ free ][ char data ]
//!  0                          2048              trie0         trie1   char0      char1
//! ```
//!
//! `trie0` is fixed once the buffer is built; `trie1`, `char0`, and `char1`
//! move as cells and strings are appended. The free gap `char0 - trie1` is
//! kept above [`MIN_FREE_CELL_BYTES`] by [`Buffer::grow_buf`].

use crate::cell::{CellIndex, CELL_BYTES};
use crate::config::{BidiTrieConfig, HAYSTACK_WINDOW_BYTES, HEADER_BASE};
use alloc::vec;
use alloc::vec::Vec;
use core::convert::TryInto;

/// Byte offset of the `haystack_len` header slot.
const SLOT_HAYSTACK_LEN: usize = HEADER_BASE;
/// Byte offset of the `trie0` header slot.
const SLOT_TRIE0: usize = HEADER_BASE + 4;
/// Byte offset of the `trie1` header slot.
const SLOT_TRIE1: usize = HEADER_BASE + 8;
/// Byte offset of the `char0` header slot.
const SLOT_CHAR0: usize = HEADER_BASE + 12;
/// Byte offset of the `char1` header slot.
const SLOT_CHAR1: usize = HEADER_BASE + 16;

/// Total size of the haystack window plus the five header slots.
pub const FIXED_PREFIX_BYTES: usize = HEADER_BASE + 20;

/// Cells of headroom `shrink_buf` leaves between `trie1` and `char0`.
const MIN_FREE_CELL_BYTE_LENGTH: u32 = 8 * CELL_BYTES;

/// The growable byte region backing one or more tries.
///
/// Owns the single `Vec<u8>`; every other component addresses into it by
/// offset rather than holding its own allocation.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    page_size: u32,
}

fn round_up(value: u32, to: u32) -> u32 {
    debug_assert!(to > 0);
    let rem = value % to;
    if rem == 0 {
        value
    } else {
        value + (to - rem)
    }
}

impl Buffer {
    pub(crate) fn new(config: &BidiTrieConfig) -> Buffer {
        let page_size = config.page_size as u32;
        let requested = config.byte_length.max(FIXED_PREFIX_BYTES + MIN_FREE_CELL_BYTE_LENGTH as usize);
        let length = round_up(requested as u32, page_size);
        let char0_hint = config
            .char0
            .map(|c| c as u32)
            .unwrap_or(length / 2)
            .max((FIXED_PREFIX_BYTES as u32) + MIN_FREE_CELL_BYTE_LENGTH);
        let char0 = char0_hint.min(length);

        let mut data = vec![0u8; length as usize];
        let trie0 = FIXED_PREFIX_BYTES as u32;
        Self::write_u32(&mut data, SLOT_TRIE0, trie0);
        Self::write_u32(&mut data, SLOT_TRIE1, trie0);
        Self::write_u32(&mut data, SLOT_CHAR0, char0);
        Self::write_u32(&mut data, SLOT_CHAR1, char0);
        Self::write_u32(&mut data, SLOT_HAYSTACK_LEN, 0);

        log::debug!(
            "bidi-trie: new buffer, length={length} trie0={trie0} char0={char0}"
        );

        Buffer { data, page_size }
    }

    #[inline]
    fn read_u32(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
    }

    #[inline]
    fn write_u32(data: &mut [u8], at: usize, value: u32) {
        data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn haystack_len(&self) -> u32 {
        Self::read_u32(&self.data, SLOT_HAYSTACK_LEN)
    }

    #[inline]
    pub fn set_haystack_len(&mut self, len: u32) {
        Self::write_u32(&mut self.data, SLOT_HAYSTACK_LEN, len);
    }

    #[inline]
    pub fn trie0(&self) -> u32 {
        Self::read_u32(&self.data, SLOT_TRIE0)
    }

    #[inline]
    pub fn trie1(&self) -> u32 {
        Self::read_u32(&self.data, SLOT_TRIE1)
    }

    #[inline]
    fn set_trie1(&mut self, v: u32) {
        Self::write_u32(&mut self.data, SLOT_TRIE1, v);
    }

    #[inline]
    pub fn char0(&self) -> u32 {
        Self::read_u32(&self.data, SLOT_CHAR0)
    }

    #[inline]
    fn set_char0(&mut self, v: u32) {
        Self::write_u32(&mut self.data, SLOT_CHAR0, v);
    }

    #[inline]
    pub fn char1(&self) -> u32 {
        Self::read_u32(&self.data, SLOT_CHAR1)
    }

    #[inline]
    fn set_char1(&mut self, v: u32) {
        Self::write_u32(&mut self.data, SLOT_CHAR1, v);
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    /// The haystack window, `[0, 2048)`.
    #[inline]
    pub fn haystack_window(&self) -> &[u8] {
        &self.data[..HAYSTACK_WINDOW_BYTES]
    }

    #[inline]
    pub fn haystack_window_mut(&mut self) -> &mut [u8] {
        &mut self.data[..HAYSTACK_WINDOW_BYTES]
    }

    /// Valid haystack bytes, `[0, haystack_len())`.
    #[inline]
    pub fn haystack(&self) -> &[u8] {
        &self.data[..self.haystack_len() as usize]
    }

    #[inline]
    pub fn byte(&self, at: u32) -> u8 {
        self.data[at as usize]
    }

    #[inline]
    pub fn bytes(&self, at: u32, len: u32) -> &[u8] {
        &self.data[at as usize..(at + len) as usize]
    }

    /// Writes `bytes` starting at absolute offset `at`.
    ///
    /// # Correctness
    ///
    /// `at + bytes.len() <= char1()` (i.e. `grow_buf` was already called to
    /// reserve the room).
    #[inline]
    pub(crate) fn write_chars(&mut self, at: u32, bytes: &[u8]) {
        let at = at as usize;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
    }

    /// Advances `char1` by `n` bytes after a `write_chars` call.
    #[inline]
    pub(crate) fn bump_char1(&mut self, n: u32) {
        let char1 = self.char1();
        self.set_char1(char1 + n);
    }

    // -- cell access -----------------------------------------------------

    /// Reads the three words of the cell at `idx`.
    #[inline]
    pub fn read_cell(&self, idx: CellIndex) -> [u32; 3] {
        let at = (idx * 4) as usize;
        [
            Self::read_u32(&self.data, at),
            Self::read_u32(&self.data, at + 4),
            Self::read_u32(&self.data, at + 8),
        ]
    }

    /// Reads word `word` (0, 1, or 2) of the cell at `idx`.
    #[inline]
    pub fn read_word(&self, idx: CellIndex, word: u32) -> u32 {
        Self::read_u32(&self.data, ((idx + word) * 4) as usize)
    }

    /// Writes word `word` (0, 1, or 2) of the cell at `idx`.
    #[inline]
    pub fn write_word(&mut self, idx: CellIndex, word: u32, value: u32) {
        Self::write_u32(&mut self.data, ((idx + word) * 4) as usize, value);
    }

    /// Bump-allocates a zeroed cell, returning its word index.
    ///
    /// # Correctness
    ///
    /// `char0() - trie1() >= CELL_BYTES`; callers must have called
    /// `grow_buf` first to guarantee headroom for the whole batch.
    pub(crate) fn allocate_cell(&mut self) -> CellIndex {
        let trie1 = self.trie1();
        debug_assert!(
            self.char0() - trie1 >= CELL_BYTES,
            "allocate_cell called without sufficient headroom"
        );
        let at = trie1 as usize;
        self.data[at..at + CELL_BYTES as usize].fill(0);
        self.set_trie1(trie1 + CELL_BYTES);
        trie1 / 4
    }

    // -- growth ------------------------------------------------------------

    /// Ensures at least `trie_bytes_needed` of trie headroom and
    /// `char_bytes_needed` of character-region headroom, growing and/or
    /// sliding the character region as needed.
    pub(crate) fn grow_buf(&mut self, trie_bytes_needed: u32, char_bytes_needed: u32) {
        let trie1 = self.trie1();
        let char0 = self.char0();
        let char1 = self.char1();
        let used_chars = char1 - char0;

        let needed_char0 = round_up(trie1 + trie_bytes_needed + MIN_FREE_CELL_BYTE_LENGTH, self.page_size);
        let new_char0 = needed_char0.max(char0);
        let new_length = round_up(new_char0 + used_chars + char_bytes_needed, self.page_size);

        if new_char0 != char0 || new_length != self.len() {
            self.resize_buf(new_length, new_char0);
        }
    }

    /// Performs the actual relocation described in `grow_buf`.
    pub(crate) fn resize_buf(&mut self, new_length: u32, new_char0: u32) {
        let old_char0 = self.char0();
        let old_char1 = self.char1();
        let trie1 = self.trie1();
        let used_chars = old_char1 - old_char0;

        log::trace!(
            "bidi-trie: resize_buf old_len={} new_len={new_length} old_char0={old_char0} new_char0={new_char0}",
            self.len(),
        );

        if new_length != self.len() {
            let mut new_data = vec![0u8; new_length as usize];
            new_data[..trie1 as usize].copy_from_slice(&self.data[..trie1 as usize]);
            new_data[new_char0 as usize..(new_char0 + used_chars) as usize]
                .copy_from_slice(&self.data[old_char0 as usize..old_char1 as usize]);
            self.data = new_data;
        } else if new_char0 != old_char0 {
            // `copy_within` handles the overlap correctly in either direction.
            self.data
                .copy_within(old_char0 as usize..old_char1 as usize, new_char0 as usize);
        }

        self.set_char0(new_char0);
        self.set_char1(new_char0 + used_chars);
    }

    /// Packs the character region immediately after the trie region (with
    /// headroom) and trims the buffer to just past it.
    pub(crate) fn shrink_buf(&mut self) {
        let trie1 = self.trie1();
        let new_char0 = trie1 + MIN_FREE_CELL_BYTE_LENGTH;
        let used_chars = self.char1() - self.char0();
        self.resize_buf(new_char0 + used_chars + 256, new_char0);
        let trimmed = self.char1() + 256;
        log::debug!("bidi-trie: shrink_buf trimming to {trimmed} bytes");
        self.data.truncate(trimmed.min(self.len()) as usize);
    }

    // -- reset / replace -----------------------------------------------

    pub(crate) fn reset(&mut self) {
        let trie0 = self.trie0();
        let char0 = self.char0();
        self.set_trie1(trie0);
        self.set_char1(char0);
        log::debug!("bidi-trie: reset");
    }

    /// Truncated byte image suitable for [`crate::serialize::serialize`].
    pub(crate) fn used_image(&self) -> &[u8] {
        let used = round_up(self.char1(), 4) as usize;
        &self.data[..used.min(self.data.len())]
    }

    /// Replaces the buffer contents from a previously serialized image,
    /// growing first if the image is larger than the current buffer.
    pub(crate) fn load_image(&mut self, image: &[u8]) {
        if image.len() as u32 > self.len() {
            let new_length = round_up(image.len() as u32, self.page_size);
            let mut new_data = vec![0u8; new_length as usize];
            new_data[..image.len()].copy_from_slice(image);
            self.data = new_data;
        } else {
            self.data[..image.len()].copy_from_slice(image);
            self.data[image.len()..].fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_invariants() {
        let buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        assert!(buf.trie0() <= buf.trie1());
        assert!(buf.trie1() <= buf.char0());
        assert!(buf.char0() <= buf.char1());
        assert!(buf.char1() <= buf.len());
    }

    #[test]
    fn allocate_cell_bumps_trie1() {
        let mut buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        buf.grow_buf(CELL_BYTES * 4, 0);
        let before = buf.trie1();
        let idx = buf.allocate_cell();
        assert_eq!(idx * 4, before);
        assert_eq!(buf.trie1(), before + CELL_BYTES);
        assert_eq!(buf.read_cell(idx), [0, 0, 0]);
    }

    #[test]
    fn grow_buf_preserves_char_bytes() {
        let mut buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        buf.grow_buf(CELL_BYTES, 8);
        let char0 = buf.char0();
        buf.write_word(char0 / 4, 0, 0xdead_beef);
        let char1_before = buf.char1();
        buf.set_char1_for_test(char1_before + 4);
        for _ in 0..2000 {
            buf.grow_buf(CELL_BYTES, 8);
        }
        assert_eq!(buf.read_word(buf.char0() / 4, 0), 0xdead_beef);
    }

    impl Buffer {
        fn set_char1_for_test(&mut self, v: u32) {
            Self::write_u32(&mut self.data, SLOT_CHAR1, v);
        }
    }
}
