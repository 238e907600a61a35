#![no_std]
#![deny(unsafe_code, rust_2018_idioms)]
#![warn(missing_debug_implementations)]

//! Bidirectional Segment Trie
//!
//! A compact data structure that stores tokenized patterns — each a pair
//! `(left, right)` of byte strings sharing a common anchor *pivot* — over a
//! single backing byte buffer, and answers *"at haystack position `i`, does
//! some stored pattern match with its pivot aligned at `i`?"*.
//!
//! No per-node heap allocations: trie cells, interned pattern bytes, and the
//! haystack itself all live in one growable [`Vec<u8>`](alloc::vec::Vec),
//! addressed by plain `u32` word indices rather than pointers. This makes the
//! whole structure trivially [`serialize`](Container::serialize)able as a
//! raw byte image.
//!
//! # Example
//!
//! ```
//! use bidi_trie::{BidiTrieConfig, Container};
//!
//! let mut container = Container::with_config(BidiTrieConfig::new());
//! let mut trie = container.new_trie();
//! let boundary = {
//!     let mut handle = container.handle(&mut trie);
//!     handle.add(b"-images/", b"ad-")
//! };
//! container.set_extra(boundary, 1); // unconditional accept
//!
//! container.set_haystack(b"http://x/-images/ad-banner");
//! let pivot = b"http://x/-images/".len();
//! assert!(container.matches(trie.root(), pivot).is_some());
//! ```
//!
//! # Features
//!
//! - `alloc` (implied by `std`): the minimum needed to build a `Container`.
//! - `std` (default): enables `std::error::Error` for [`BidiTrieError`].
//! - `simd`: selects a `memchr`-backed implementation of the string search
//!   primitives, behaviorally identical to the always-available portable one.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod buffer;
pub mod cell;
pub mod config;
pub mod error;
pub mod intern;
pub mod search;
pub mod serialize;
pub mod trie;

pub use crate::cell::CellIndex;
pub use crate::config::BidiTrieConfig;
pub use crate::error::BidiTrieError;
pub use crate::trie::{Container, MatchInfo, Trie, TrieHandle};
