// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn solitary_lf_rewritten_to_cr() {
    let mut n = StdinNormalizer::new(true);
    assert_eq!(n.feed(b"hello\n"), b"hello\r");
}

#[test]
fn crlf_preserved() {
    let mut n = StdinNormalizer::new(true);
    assert_eq!(n.feed(b"hello\r\n"), b"hello\r\n");
}

#[test]
fn crlf_split_across_feed_calls_is_preserved() {
    let mut n = StdinNormalizer::new(true);
    let mut out = n.feed(b"hello\r");
    out.extend(n.feed(b"\nworld\n"));
    assert_eq!(out, b"hello\r\nworld\r");
}

#[test]
fn disabled_passes_through_unchanged() {
    let mut n = StdinNormalizer::new(false);
    assert_eq!(n.feed(b"hello\n"), b"hello\n");
}
