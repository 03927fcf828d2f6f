// SPDX-License-Identifier: MIT

//! Color resolution for SGR parameters: the classic 16-color table, the
//! 256-color 6×6×6 cube + grayscale ramp, and 24-bit truecolor.

/// The 16 standard ANSI colors, indices 0-15 (0-7 normal, 8-15 bright).
const ANSI_16: [&str; 16] = [
    "#000000", "#800000", "#008000", "#808000", "#000080", "#800080", "#008080", "#c0c0c0",
    "#808080", "#ff0000", "#00ff00", "#ffff00", "#0000ff", "#ff00ff", "#00ffff", "#ffffff",
];

/// Resolve an ANSI-16 index (0-15) to a lowercase `#rrggbb` string.
pub fn ansi16(index: u8) -> String {
    ANSI_16[(index as usize) % 16].to_owned()
}

/// Resolve an ANSI-256 index (0-255) to a lowercase `#rrggbb` string.
///
/// 0-15: the 16-color table. 16-231: a 6×6×6 color cube where each
/// component is `0` for `n == 0` else `55 + 40*n`. 232-255: a 24-step
/// grayscale ramp, `8 + 10*k`.
pub fn ansi256(index: u8) -> String {
    if index < 16 {
        return ansi16(index);
    }
    if index >= 232 {
        let k = (index - 232) as u32;
        let v = 8 + 10 * k;
        return format!("#{v:02x}{v:02x}{v:02x}");
    }
    let cube = (index - 16) as u32;
    let r = cube / 36;
    let g = (cube % 36) / 6;
    let b = cube % 6;
    let component = |n: u32| if n == 0 { 0 } else { 55 + 40 * n };
    format!("#{:02x}{:02x}{:02x}", component(r), component(g), component(b))
}

/// Resolve a 24-bit truecolor triple to a lowercase `#rrggbb` string.
pub fn truecolor(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
#[path = "palette_tests.rs"]
mod tests;
