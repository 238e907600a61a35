//! Byte-exact string search primitives over the backing buffer.
//!
//! Two behaviorally-equivalent implementations exist: [`PortableSearch`]
//! (always available) and, behind the `simd` feature, [`AcceleratedSearch`]
//! (backed by `memchr`). Both operate over absolute buffer offsets; `hl`/`hr`
//! bound the haystack search window, `nl` is a needle offset relative to
//! `char0`.

use crate::buffer::Buffer;

/// String-search operations over one [`Buffer`].
///
/// Exists as a trait so `simd`-accelerated and portable implementations can
/// be swapped at [`crate::Container`] construction time without touching
/// call sites in the trie engine.
pub trait SearchOps {
    /// Does the haystack slice `[hl, hr)` start with the needle
    /// `[char0 + nl, char0 + nl + n_len)`?
    fn starts_with(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> bool;

    /// Leftmost offset in `[hl, hr - n_len]` where the needle occurs, if any.
    fn index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32>;

    /// Rightmost offset in `[hl, hr - n_len]` where the needle occurs, if any.
    fn last_index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32>;
}

/// A straightforward byte-compare implementation. Endian-clean by
/// construction since it only ever reads individual bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableSearch;

impl SearchOps for PortableSearch {
    fn starts_with(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> bool {
        if hl + n_len > hr {
            return false;
        }
        let needle_base = buf.char0() + nl;
        (0..n_len).all(|i| buf.byte(hl + i) == buf.byte(needle_base + i))
    }

    fn index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32> {
        if n_len == 0 {
            return Some(hl);
        }
        if hl + n_len > hr {
            return None;
        }
        let mut at = hl;
        while at + n_len <= hr {
            if self.starts_with(buf, at, hr, nl, n_len) {
                return Some(at);
            }
            at += 1;
        }
        None
    }

    fn last_index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32> {
        if n_len == 0 {
            return Some(hr);
        }
        if hl + n_len > hr {
            return None;
        }
        let mut at = hr - n_len;
        loop {
            if self.starts_with(buf, at, hr, nl, n_len) {
                return Some(at);
            }
            if at == hl {
                return None;
            }
            at -= 1;
        }
    }
}

/// `memchr`-backed implementation, selected via
/// [`BidiTrieConfig::accelerated_search`](crate::BidiTrieConfig::accelerated_search).
#[cfg(feature = "simd")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceleratedSearch;

#[cfg(feature = "simd")]
impl SearchOps for AcceleratedSearch {
    fn starts_with(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> bool {
        // No memchr primitive beats a direct compare for this case.
        PortableSearch.starts_with(buf, hl, hr, nl, n_len)
    }

    fn index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32> {
        if n_len == 0 {
            return Some(hl);
        }
        if hl + n_len > hr {
            return None;
        }
        let haystack = buf.bytes(hl, hr - hl);
        let needle = buf.bytes(buf.char0() + nl, n_len);
        memchr::memmem::find(haystack, needle).map(|pos| hl + pos as u32)
    }

    fn last_index_of(&self, buf: &Buffer, hl: u32, hr: u32, nl: u32, n_len: u32) -> Option<u32> {
        if n_len == 0 {
            return Some(hr);
        }
        if hl + n_len > hr {
            return None;
        }
        let haystack = buf.bytes(hl, hr - hl);
        let needle = buf.bytes(buf.char0() + nl, n_len);
        memchr::memmem::rfind(haystack, needle).map(|pos| hl + pos as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BidiTrieConfig;
    use crate::intern::store_string;

    fn harness() -> Buffer {
        Buffer::new(&BidiTrieConfig::new().page_size(4096))
    }

    #[test]
    fn starts_with_matches_at_exact_offset() {
        let mut buf = harness();
        buf.haystack_window_mut()[..5].copy_from_slice(b"adbox");
        buf.set_haystack_len(5);
        let nl = store_string(&mut buf, b"ad");
        assert!(PortableSearch.starts_with(&buf, 0, 5, nl, 2));
        assert!(!PortableSearch.starts_with(&buf, 1, 5, nl, 2));
    }

    #[test]
    fn index_of_finds_leftmost() {
        let mut buf = harness();
        buf.haystack_window_mut()[..11].copy_from_slice(b"adxxadyyadz");
        buf.set_haystack_len(11);
        let nl = store_string(&mut buf, b"ad");
        assert_eq!(PortableSearch.index_of(&buf, 0, 11, nl, 2), Some(0));
        assert_eq!(PortableSearch.last_index_of(&buf, 0, 11, nl, 2), Some(8));
    }

    #[test]
    fn no_match_returns_none() {
        let mut buf = harness();
        buf.haystack_window_mut()[..5].copy_from_slice(b"xxxxx");
        buf.set_haystack_len(5);
        let nl = store_string(&mut buf, b"ad");
        assert_eq!(PortableSearch.index_of(&buf, 0, 5, nl, 2), None);
        assert_eq!(PortableSearch.last_index_of(&buf, 0, 5, nl, 2), None);
    }

    #[cfg(feature = "simd")]
    #[test]
    fn accelerated_matches_portable() {
        let mut buf = harness();
        buf.haystack_window_mut()[..11].copy_from_slice(b"adxxadyyadz");
        buf.set_haystack_len(11);
        let nl = store_string(&mut buf, b"ad");
        assert_eq!(
            PortableSearch.index_of(&buf, 0, 11, nl, 2),
            AcceleratedSearch.index_of(&buf, 0, 11, nl, 2)
        );
        assert_eq!(
            PortableSearch.last_index_of(&buf, 0, 11, nl, 2),
            AcceleratedSearch.last_index_of(&buf, 0, 11, nl, 2)
        );
    }
}
