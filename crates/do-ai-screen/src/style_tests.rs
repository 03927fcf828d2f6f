// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn unset_color_is_distinct_from_black() {
    let unset = Style::default();
    let black = Style { fg: Some("#000000".to_owned()), ..Style::default() };
    assert_ne!(unset, black);
}

#[test]
fn reset_clears_everything() {
    let mut s = Style {
        fg: Some("#ff0000".to_owned()),
        bg: Some("#00ff00".to_owned()),
        bold: true,
        italic: true,
        underline: true,
    };
    s.reset();
    assert_eq!(s, Style::default());
}
