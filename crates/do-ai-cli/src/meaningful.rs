// SPDX-License-Identifier: MIT

//! P4: decide which PTY bytes reset the idle timer. Delegates the actual
//! escape-sequence boundary logic to `do-ai-screen::strip`, which the relay
//! side also uses for line sanitization — both need the exact same 3-byte
//! character-set-designator rule.

use do_ai_screen::strip::{has_meaningful_byte, AnsiStripper};

/// Stateful filter: carries a partial trailing escape sequence across
/// `feed()` calls, same as the stripper it wraps.
#[derive(Default)]
pub struct MeaningfulFilter {
    stripper: AnsiStripper,
}

impl MeaningfulFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff `chunk` should reset `lastMeaningfulOutput`.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        let stripped = self.stripper.feed(chunk);
        has_meaningful_byte(&stripped)
    }
}

#[cfg(test)]
#[path = "meaningful_tests.rs"]
mod tests;
