//! The one fallible external operation this crate has: [`deserialize`][super::Container::deserialize].
//!
//! Everything else is infallible by construction — see the "# Correctness"
//! doc sections scattered through [`crate::buffer`] and [`crate::trie`] for
//! the preconditions that are instead enforced with `debug_assert!`.

use core::fmt;

/// Failure modes for [`Container::deserialize`](crate::Container::deserialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidiTrieError {
    /// The image was empty; there is nothing to restore.
    EmptyImage,
    /// The image was shorter than the fixed header it claims to contain.
    TruncatedHeader { image_len: usize },
}

impl fmt::Display for BidiTrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidiTrieError::EmptyImage => write!(f, "cannot deserialize an empty image"),
            BidiTrieError::TruncatedHeader { image_len } => write!(
                f,
                "image of {image_len} bytes is shorter than the fixed header"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BidiTrieError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_nonempty() {
        assert!(!BidiTrieError::EmptyImage.to_string().is_empty());
        assert!(!BidiTrieError::TruncatedHeader { image_len: 3 }
            .to_string()
            .is_empty());
    }
}
