// SPDX-License-Identifier: MIT

//! ANSI escape stripping, shared between the idle-detection "meaningful
//! output" rule and the relay's per-line text sanitization. Both need the
//! exact same escape-sequence boundaries, in particular the 3-byte
//! character-set designator rule (P5): a 2-byte interpretation would leak
//! the trailing letter — commonly `B` — as visible content.

/// Classify the escape sequence starting at `data[0]` (which must be
/// `ESC`, `0x1b`). Returns the number of bytes it occupies, or `None` if
/// the sequence is not yet complete and more data is needed.
pub fn scan_escape(data: &[u8]) -> Option<usize> {
    debug_assert_eq!(data.first(), Some(&0x1b));
    if data.len() < 2 {
        return None;
    }
    match data[1] {
        // CSI: ESC [ ... final (0x40..=0x7e)
        b'[' => {
            for (off, &b) in data[2..].iter().enumerate() {
                if (0x40..=0x7e).contains(&b) {
                    return Some(2 + off + 1);
                }
            }
            None
        }
        // OSC / DCS / PM / APC: terminated by BEL or ST (ESC \).
        b']' | b'P' | b'^' | b'_' => {
            let mut i = 2;
            while i < data.len() {
                if data[i] == 0x07 {
                    return Some(i + 1);
                }
                if data[i] == 0x1b && i + 1 < data.len() && data[i + 1] == b'\\' {
                    return Some(i + 2);
                }
                i += 1;
            }
            None
        }
        // Character-set designators: ESC + intermediate + final = 3 bytes.
        // Critical: must consume all 3, never the 2-byte `ESC intermediate`
        // form, or the final letter leaks into the stripped output.
        b'(' | b')' | b'*' | b'+' | b'-' | b'.' | b'/' | b'X' => {
            if data.len() < 3 {
                None
            } else {
                Some(3)
            }
        }
        // Other two-byte escapes (cursor save/restore, reset, etc).
        _ => Some(2),
    }
}

/// Stateful ANSI stripper: carries an incomplete trailing escape sequence
/// across `feed()` calls so streamed PTY chunks don't leak partial bytes.
#[derive(Debug, Default)]
pub struct AnsiStripper {
    pending: Vec<u8>,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip escape sequences from `data`, prepending any carried-over
    /// partial sequence from the previous call.
    pub fn feed(&mut self, data: &[u8]) -> Vec<u8> {
        let owned;
        let input: &[u8] = if self.pending.is_empty() {
            data
        } else {
            owned = [self.pending.as_slice(), data].concat();
            &owned
        };
        self.pending.clear();

        let mut out = Vec::with_capacity(input.len());
        let mut i = 0;
        while i < input.len() {
            if input[i] == 0x1b {
                match scan_escape(&input[i..]) {
                    Some(len) => {
                        i += len;
                        continue;
                    }
                    None => {
                        self.pending = input[i..].to_vec();
                        break;
                    }
                }
            }
            out.push(input[i]);
            i += 1;
        }
        out
    }
}

/// One-shot strip of a self-contained byte slice (no carry-over).
pub fn strip_ansi_once(data: &[u8]) -> Vec<u8> {
    AnsiStripper::new().feed(data)
}

/// P4: a chunk resets the idle timer iff, after stripping, it contains at
/// least one byte outside `{space, tab, control}`.
pub fn has_meaningful_byte(data: &[u8]) -> bool {
    data.iter().any(|&b| !(b == b' ' || b == b'\t' || b < 0x20 || b == 0x7f))
}

/// Belt-and-braces guard (§4.5, §9-4): suppress a lone `B` rune bounded on
/// both sides by whitespace or a string boundary — a heuristic for
/// residual designator leaks from sources other than this parser.
pub fn suppress_isolated_b(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (idx, &c) in chars.iter().enumerate() {
        if c == 'B' {
            let left_ok = idx == 0 || chars[idx - 1].is_whitespace();
            let right_ok = idx + 1 == chars.len() || chars[idx + 1].is_whitespace();
            if left_ok && right_ok {
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[path = "strip_tests.rs"]
mod tests;
