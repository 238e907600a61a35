//! Construction options for a [`Container`](crate::Container).

use alloc::boxed::Box;

/// Default page size backing a [`Container`]'s buffer growth.
pub const DEFAULT_PAGE_SIZE: usize = 128 * 1024;

/// Floor on initial buffer capacity, expressed in pages.
pub const MIN_CAPACITY_PAGES: usize = 4;

/// Bytes reserved at the front of the buffer for the haystack window.
pub const HAYSTACK_WINDOW_BYTES: usize = 2048;

/// Byte offset, within the buffer, of the five `u32` header slots.
pub const HEADER_BASE: usize = HAYSTACK_WINDOW_BYTES;

/// Caller-supplied predicate deciding whether a conditional boundary cell
/// accepts a match.
///
/// Called as `extra_handler(l, r, extra_id)`; a return of `0` rejects, any
/// other value becomes the `extra` field of the resulting [`crate::MatchInfo`].
pub type ExtraHandler = Box<dyn Fn(usize, usize, u32) -> u32 + Send + Sync>;

/// Builder collecting the options a [`Container`](crate::Container) is built
/// from: advisory capacity, the initial offset of the character region, and
/// the optional extra-handler predicate.
///
/// ```
/// use bidi_trie::BidiTrieConfig;
///
/// let config = BidiTrieConfig::new()
///     .byte_length(256 * 1024)
///     .extra_handler(|_l, _r, extra_id| if extra_id == 9 { extra_id } else { 0 });
/// ```
pub struct BidiTrieConfig {
    pub(crate) byte_length: usize,
    pub(crate) char0: Option<usize>,
    pub(crate) page_size: usize,
    pub(crate) extra_handler: Option<ExtraHandler>,
    #[cfg(feature = "simd")]
    pub(crate) accelerated_search: bool,
}

impl Default for BidiTrieConfig {
    fn default() -> Self {
        BidiTrieConfig {
            byte_length: DEFAULT_PAGE_SIZE * MIN_CAPACITY_PAGES,
            char0: None,
            page_size: DEFAULT_PAGE_SIZE,
            extra_handler: None,
            #[cfg(feature = "simd")]
            accelerated_search: false,
        }
    }
}

impl BidiTrieConfig {
    /// A config with every option defaulted.
    pub fn new() -> Self {
        BidiTrieConfig::default()
    }

    /// A config with the initial buffer capacity hint pre-set.
    pub fn with_capacity(byte_length: usize) -> Self {
        BidiTrieConfig::new().byte_length(byte_length)
    }

    /// Advisory initial capacity in bytes. Rounded up to a page and floored
    /// at `4 * page_size` when the container is built.
    pub fn byte_length(mut self, byte_length: usize) -> Self {
        self.byte_length = byte_length;
        self
    }

    /// Advisory initial offset of the character region. Defaults to
    /// `buffer_length / 2` when unset.
    pub fn char0(mut self, char0: usize) -> Self {
        self.char0 = Some(char0);
        self
    }

    /// The page size all buffer growth rounds up to. Defaults to 128 KiB.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The predicate used to decide acceptance for boundary cells whose
    /// `EXTRA` is neither `0` nor `1`.
    ///
    /// May be left unset only if no stored pattern ever sets an `extra` value
    /// greater than `1`; see `debug_assert!`s in [`crate::trie`].
    pub fn extra_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(usize, usize, u32) -> u32 + Send + Sync + 'static,
    {
        self.extra_handler = Some(Box::new(handler));
        self
    }

    /// Select the `memchr`-backed string search primitives instead of the
    /// portable byte-loop implementation. Requires the `simd` feature.
    #[cfg(feature = "simd")]
    pub fn accelerated_search(mut self, enabled: bool) -> Self {
        self.accelerated_search = enabled;
        self
    }
}
