// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn p4_pure_repaint_has_no_meaningful_byte() {
    let stripped = strip_ansi_once(b"\x1b[2J\x1b[H   \t");
    assert!(!has_meaningful_byte(&stripped));
}

#[test]
fn p4_visible_text_is_meaningful() {
    let stripped = strip_ansi_once(b"\x1b[2Jhello");
    assert!(has_meaningful_byte(&stripped));
}

#[test]
fn p5_charset_designator_leaves_no_trailing_letter() {
    let stripped = strip_ansi_once(b"alpha\x1b(Bbeta\n");
    assert_eq!(stripped, b"alphabeta\n");
}

#[test]
fn designator_consumes_three_bytes_not_two() {
    // If this regressed to a 2-byte interpretation, scan_escape would
    // return Some(2) and leave the `B` in the stripped stream.
    assert_eq!(scan_escape(b"\x1b(B"), Some(3));
}

#[test]
fn csi_scan_finds_final_byte() {
    assert_eq!(scan_escape(b"\x1b[31mrest"), Some(5));
}

#[test]
fn csi_scan_incomplete_returns_none() {
    assert_eq!(scan_escape(b"\x1b[31"), None);
}

#[test]
fn osc_scan_terminated_by_bel() {
    assert_eq!(scan_escape(b"\x1b]0;title\x07rest"), Some(10));
}

#[test]
fn osc_scan_terminated_by_st() {
    assert_eq!(scan_escape(b"\x1b]0;title\x1b\\rest"), Some(11));
}

#[test]
fn stripper_carries_partial_escape_across_feed_calls() {
    let mut s = AnsiStripper::new();
    let first = s.feed(b"hello\x1b[3");
    let second = s.feed(b"1mworld");
    assert_eq!(first, b"hello");
    assert_eq!(second, b"world");
}

#[test]
fn isolated_b_is_suppressed_between_whitespace() {
    assert_eq!(suppress_isolated_b("alpha B beta"), "alpha  beta");
}

#[test]
fn non_isolated_b_is_kept() {
    assert_eq!(suppress_isolated_b("Build the thing"), "Build the thing");
    assert_eq!(suppress_isolated_b("BB"), "BB");
}
