//! Smol utilities for logging

use std::ascii;

/// Make an Ascii-safe string
pub fn ascii_escape(s: &[u8]) -> String {
    s.iter()
        .flat_map(|&b| ascii::escape_default(b))
        .map(char::from)
        .collect()
}

#[test]
fn ascii_escape_keeps_printables() {
    assert_eq!(ascii_escape(b"PHP Warning: x"), "PHP Warning: x");
}

#[test]
fn ascii_escape_escapes_control_and_high_bytes() {
    assert_eq!(ascii_escape(b"a\nb\xff\""), "a\\nb\\xff\\\"");
}
