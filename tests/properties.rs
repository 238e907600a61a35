//! Property-based tests for the testable claims in the design (§8):
//! round-trip insert/iterate, pivot symmetry, reset idempotence, the
//! serialization law, and absence of false positives.

use bidi_trie::cell::EXTRA_ACCEPT_ALWAYS;
use bidi_trie::{BidiTrieConfig, Container};
use proptest::collection::vec as pvec;
use proptest::prelude::*;
use std::collections::BTreeSet;

const ASCII_SEGMENT: &str = "[a-z]{0,20}";

fn config() -> BidiTrieConfig {
    BidiTrieConfig::new().page_size(4096)
}

fn pattern_strategy() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (ASCII_SEGMENT, ASCII_SEGMENT)
        .prop_filter("right side must be non-empty", |(_, r)| !r.is_empty())
        .prop_map(|(l, r)| (l.into_bytes(), r.into_bytes()))
}

proptest! {
    #[test]
    fn round_trip_insert_iterate(patterns in pvec(pattern_strategy(), 0..30)) {
        let mut container = Container::with_config(config());
        let mut trie = container.new_trie();
        {
            let mut handle = container.handle(&mut trie);
            for (l, r) in &patterns {
                let boundary = handle.add(l, r);
                handle.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);
            }
        }
        let handle = container.handle(&mut trie);
        let iterated: BTreeSet<String> = handle.iter().map(|s| s.into_owned()).collect();
        let expected: BTreeSet<String> = patterns
            .iter()
            .map(|(_, r)| String::from_utf8(r.clone()).unwrap())
            .collect();
        prop_assert_eq!(iterated, expected);
    }

    #[test]
    fn pivot_symmetry((left, right) in pattern_strategy()) {
        let mut container = Container::with_config(config());
        let mut trie = container.new_trie();
        let boundary = {
            let mut handle = container.handle(&mut trie);
            handle.add(&left, &right)
        };
        container.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);

        let mut haystack = left.clone();
        haystack.extend_from_slice(&right);
        container.set_haystack(&haystack);

        let info = container.matches(trie.root(), left.len());
        prop_assert!(info.is_some());
        let info = info.unwrap();
        prop_assert_eq!(info.l, 0);
        prop_assert_eq!(info.r, haystack.len());
    }

    #[test]
    fn reset_is_idempotent((left, right) in pattern_strategy()) {
        let mut container = Container::with_config(config());
        let mut trie = container.new_trie();
        let boundary = {
            let mut handle = container.handle(&mut trie);
            handle.add(&left, &right)
        };
        container.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);

        container.reset();
        let mut fresh_trie = container.new_trie();

        let mut haystack = left.clone();
        haystack.extend_from_slice(&right);
        container.set_haystack(&haystack);
        prop_assert_eq!(container.matches(fresh_trie.root(), left.len()), None);

        let boundary = {
            let mut handle = container.handle(&mut fresh_trie);
            handle.add(&left, &right)
        };
        container.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);
        prop_assert!(container.matches(fresh_trie.root(), left.len()).is_some());
    }

    #[test]
    fn serialization_round_trips_matches(patterns in pvec(pattern_strategy(), 1..15)) {
        let mut container = Container::with_config(config());
        let mut trie = container.new_trie();
        {
            let mut handle = container.handle(&mut trie);
            for (l, r) in &patterns {
                let boundary = handle.add(l, r);
                handle.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);
            }
        }
        let (left, right) = &patterns[0];
        let mut haystack = left.clone();
        haystack.extend_from_slice(right);
        container.set_haystack(&haystack);
        let before = container.matches(trie.root(), left.len());

        let image = container.serialize();
        let mut restored = Container::with_config(config());
        restored.deserialize(&image).unwrap();
        restored.set_haystack(&haystack);
        let after = restored.matches(trie.root(), left.len());

        prop_assert_eq!(before, after);
        prop_assert!(after.is_some());
    }

    #[test]
    fn no_false_positive_on_mismatched_haystack(
        (left, right) in pattern_strategy(),
        noise in "[a-z]{0,10}",
    ) {
        let mut container = Container::with_config(config());
        let mut trie = container.new_trie();
        let boundary = {
            let mut handle = container.handle(&mut trie);
            handle.add(&left, &right)
        };
        container.set_extra(boundary, EXTRA_ACCEPT_ALWAYS);

        let mut haystack = left.clone();
        haystack.extend_from_slice(noise.as_bytes());
        container.set_haystack(&haystack);

        let result = container.matches(trie.root(), left.len());
        // A match is only legitimate if the haystack's bytes from the pivot
        // onward begin with the stored right side; anything else is a false
        // positive.
        if noise.as_bytes().starts_with(right.as_slice()) {
            prop_assert!(result.is_some());
        } else {
            prop_assert_eq!(result, None);
        }
    }
}
