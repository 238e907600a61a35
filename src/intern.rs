//! Appends raw pattern bytes into the buffer's character region.

use crate::buffer::Buffer;
use crate::cell::MAX_SEGMENT_LEN;
use alloc::borrow::Cow;
use alloc::string::String;

/// Appends `bytes` to the character region, growing the buffer first if
/// necessary, and returns the offset of the stored bytes relative to
/// `char0` (i.e. what a cell's `SEGMENT_INFO` packs as `char_offset`).
///
/// # Correctness
///
/// `bytes.len() <= 255` so the length fits the packed segment field.
pub fn store_string(buf: &mut Buffer, bytes: &[u8]) -> u32 {
    debug_assert!(
        bytes.len() <= MAX_SEGMENT_LEN,
        "pattern segment of {} bytes exceeds the {MAX_SEGMENT_LEN}-byte limit",
        bytes.len()
    );
    buf.grow_buf(0, bytes.len() as u32);
    let char0 = buf.char0();
    let offset = buf.char1() - char0;
    let at = buf.char1();
    buf.write_chars(at, bytes);
    buf.bump_char1(bytes.len() as u32);
    offset
}

/// Decodes `[char0 + offset, char0 + offset + len)` as UTF-8 for
/// presentation; not used on the match hot path. Falls back to a lossy
/// decode since the interner is byte-exact and never guarantees UTF-8.
pub fn extract_string(buf: &Buffer, offset: u32, len: u8) -> Cow<'_, str> {
    let at = buf.char0() + offset;
    let bytes = buf.bytes(at, len as u32);
    String::from_utf8_lossy(bytes)
}

/// Lossily decodes an arbitrary byte slice (e.g. an iterator's scratch
/// buffer, which isn't addressed by buffer offset) into an owned `String`.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
