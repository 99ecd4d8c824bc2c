//! Fuzz target for key normalization and scheme parsing.
//!
//! Any string must either parse into a word scheme and a non-empty rest, or
//! be rejected, without panicking.

#![no_main]

use datagrab::resolve::{normalize_key, parse_scheme, strip_scheme};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(key) = std::str::from_utf8(data) else {
        return;
    };

    let normalized = normalize_key(key);
    if let Some((scheme, rest)) = parse_scheme(&normalized) {
        assert!(!scheme.is_empty());
        assert!(!rest.is_empty());
        assert_eq!(strip_scheme(&normalized, scheme), rest);
    }
});
