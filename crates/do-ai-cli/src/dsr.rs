// SPDX-License-Identifier: MIT

//! Device Status Report debouncing (§4.1, §9 "DSR debouncing"): a single
//! scheduled one-shot check, resettable on an observed genuine reply, not a
//! callback closure capturing mutable state without synchronization.

use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(50);
const TAIL_CAP: usize = 32;

/// Feed `chunk` through a boundary-safe tail buffer and test the combined
/// bytes with `matches`. Keeps at most the last `TAIL_CAP` bytes across
/// calls so a pattern split across two reads is still detected.
fn scan_with_tail(tail: &mut Vec<u8>, chunk: &[u8], matches: impl Fn(&[u8]) -> bool) -> bool {
    let mut combined = std::mem::take(tail);
    combined.extend_from_slice(chunk);
    let found = matches(&combined);
    let keep = combined.len().min(TAIL_CAP);
    *tail = combined[combined.len() - keep..].to_vec();
    found
}

fn contains_dsr_request(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\x1b[6n")
}

/// `ESC [ <digits> ; <digits> R` — a genuine cursor-position reply.
fn contains_dsr_reply(buf: &[u8]) -> bool {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == 0x1b && buf[i + 1] == b'[' {
            let mut j = i + 2;
            let row_start = j;
            while j < buf.len() && buf[j].is_ascii_digit() {
                j += 1;
            }
            if j > row_start && j < buf.len() && buf[j] == b';' {
                let col_start = j + 1;
                let mut k = col_start;
                while k < buf.len() && buf[k].is_ascii_digit() {
                    k += 1;
                }
                if k > col_start && k < buf.len() && buf[k] == b'R' {
                    return true;
                }
            }
        }
        i += 1;
    }
    false
}

/// Debounced DSR auto-reply state machine.
#[derive(Default)]
pub struct DsrResponder {
    request_tail: Vec<u8>,
    reply_tail: Vec<u8>,
    pending_since: Option<Instant>,
}

impl DsrResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk read from the child (PTY → local). Starts (or
    /// restarts) the debounce timer if a request is seen.
    pub fn on_child_output(&mut self, chunk: &[u8]) {
        if scan_with_tail(&mut self.request_tail, chunk, contains_dsr_request) {
            self.pending_since = Some(Instant::now());
        }
    }

    /// Feed a chunk read from the local terminal (local → child). A
    /// genuine reply cancels the pending synthesis.
    pub fn on_local_input(&mut self, chunk: &[u8]) {
        if scan_with_tail(&mut self.reply_tail, chunk, contains_dsr_reply) {
            self.pending_since = None;
        }
    }

    /// Called on each tick. If the debounce window has elapsed with no
    /// observed reply, returns the synthetic reply to write to the PTY and
    /// clears the pending state.
    pub fn check(&mut self) -> Option<&'static [u8]> {
        let since = self.pending_since?;
        if since.elapsed() >= DEBOUNCE {
            self.pending_since = None;
            Some(b"\x1b[1;1R")
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "dsr_tests.rs"]
mod tests;
