//! Raw byte-image persistence (§4.7): the live buffer, truncated to its used
//! length, *is* the serialized form — no separate encoding step.

use crate::buffer::Buffer;
use crate::error::BidiTrieError;
use alloc::vec::Vec;

/// Returns the bytes `[0, char1)` (rounded up to a 4-byte unit) of `buf`.
/// The header slots embedded in those bytes carry everything needed to
/// reconstruct `trie0`/`trie1`/`char0`/`char1` on load.
pub fn serialize(buf: &Buffer) -> Vec<u8> {
    let image = buf.used_image().to_vec();
    log::debug!("bidi-trie: serialized {} bytes", image.len());
    image
}

/// Restores `buf`'s contents from a previously `serialize`d image, growing
/// the buffer first if the image is larger than current capacity.
///
/// Corrupt-but-nonempty images are not validated beyond the length check —
/// a documented trust boundary, not an oversight (§4.7, §7).
pub fn deserialize(buf: &mut Buffer, image: &[u8]) -> Result<(), BidiTrieError> {
    if image.is_empty() {
        return Err(BidiTrieError::EmptyImage);
    }
    if image.len() < crate::buffer::FIXED_PREFIX_BYTES {
        return Err(BidiTrieError::TruncatedHeader {
            image_len: image.len(),
        });
    }
    log::debug!("bidi-trie: deserializing {} bytes", image.len());
    buf.load_image(image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BidiTrieConfig;
    use crate::intern::store_string;

    #[test]
    fn empty_image_is_rejected() {
        let mut buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        assert_eq!(deserialize(&mut buf, &[]), Err(BidiTrieError::EmptyImage));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let mut buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        assert_eq!(
            deserialize(&mut buf, &[0u8; 4]),
            Err(BidiTrieError::TruncatedHeader { image_len: 4 })
        );
    }

    #[test]
    fn round_trips_through_a_fresh_buffer() {
        let mut buf = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        store_string(&mut buf, b"images/ad");
        let image = serialize(&buf);

        let mut restored = Buffer::new(&BidiTrieConfig::new().page_size(4096));
        deserialize(&mut restored, &image).unwrap();
        assert_eq!(restored.char0(), buf.char0());
        assert_eq!(restored.char1(), buf.char1());
        assert_eq!(restored.trie1(), buf.trie1());
    }
}
