// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Current graphic rendition state: `{fg?, bg?, bold, italic, underline}`.
///
/// `fg`/`bg` use `None` to mean "unset" — distinct from an explicit
/// `#000000`, per the segment-coalescing invariant in the spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Style {
    pub fn reset(&mut self) {
        *self = Style::default();
    }
}

#[cfg(test)]
#[path = "style_tests.rs"]
mod tests;
