// SPDX-License-Identifier: MIT

//! A pragmatic VT-subset screen reconstructor.
//!
//! This is deliberately not a full VT-220 emulator — it implements the
//! slice of ANSI/ECMA-48 + DEC private modes a preview renderer needs
//! (cursor movement, scroll regions, SGR color/attributes, the alternate
//! screen, and tmux's DCS passthrough framing) and nothing more.

pub mod model;
pub mod palette;
pub mod strip;
pub mod style;

pub use model::{CursorPosition, ScreenModel, ScreenSnapshot, MAX_COLS, MAX_ROWS};
pub use style::Style;
