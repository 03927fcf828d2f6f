// SPDX-License-Identifier: MIT

use super::*;
use std::thread::sleep;

#[test]
fn no_pending_without_request() {
    let mut r = DsrResponder::new();
    assert_eq!(r.check(), None);
}

#[test]
fn synthesizes_after_debounce_with_no_reply() {
    let mut r = DsrResponder::new();
    r.on_child_output(b"hello \x1b[6n world");
    assert_eq!(r.check(), None); // not yet elapsed
    sleep(Duration::from_millis(60));
    assert_eq!(r.check(), Some(b"\x1b[1;1R".as_slice()));
    // cleared after firing
    assert_eq!(r.check(), None);
}

#[test]
fn genuine_reply_cancels_synthesis() {
    let mut r = DsrResponder::new();
    r.on_child_output(b"\x1b[6n");
    r.on_local_input(b"\x1b[24;80R");
    sleep(Duration::from_millis(60));
    assert_eq!(r.check(), None);
}

#[test]
fn request_split_across_reads_is_detected() {
    let mut r = DsrResponder::new();
    r.on_child_output(b"prefix\x1b[6");
    r.on_child_output(b"npostfix");
    sleep(Duration::from_millis(60));
    assert_eq!(r.check(), Some(b"\x1b[1;1R".as_slice()));
}

#[test]
fn reply_split_across_reads_is_detected() {
    let mut r = DsrResponder::new();
    r.on_child_output(b"\x1b[6n");
    r.on_local_input(b"\x1b[12;");
    r.on_local_input(b"34R");
    sleep(Duration::from_millis(60));
    assert_eq!(r.check(), None);
}
