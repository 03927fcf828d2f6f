// SPDX-License-Identifier: MIT

use super::*;

fn feed_all(model: &mut ScreenModel, data: &[u8]) {
    model.feed(data);
}

#[test]
fn p6_cr_overwrite() {
    let mut m = ScreenModel::new();
    feed_all(&mut m, b"abc\rxy\n");
    let snap = m.snapshot(10);
    assert_eq!(snap.lines[0], "xyc");
}

#[test]
fn p7_alt_screen_round_trip() {
    let mut m = ScreenModel::new();
    feed_all(&mut m, b"primary content\n");
    let before = m.snapshot(10).lines;
    feed_all(&mut m, b"\x1b[?1049h");
    feed_all(&mut m, b"alt screen stuff\n");
    assert!(m.is_alt_screen());
    feed_all(&mut m, b"\x1b[?1049l");
    assert!(!m.is_alt_screen());
    let after = m.snapshot(10).lines;
    assert_eq!(before, after);
}

#[test]
fn p8_tmux_dcs_passthrough() {
    let mut m = ScreenModel::new();
    m.feed(b"\x1bPtmux;\x1b\x1b[2J\x1b\x1b[Hhello\nworld\x1b\\");
    let snap = m.snapshot(10);
    assert!(snap.lines.iter().any(|l| l == "hello"));
    assert!(snap.lines.iter().any(|l| l == "world"));
}

#[test]
fn p9_sgr_segments() {
    let mut m = ScreenModel::new();
    m.feed(b"\x1b[31mRED\x1b[0m plain");
    let snap = m.snapshot(10);
    let segs = &snap.styled_lines[0];
    assert_eq!(segs[0].0, "RED");
    assert_eq!(segs[0].1.fg.as_deref(), Some("#800000"));
    assert_eq!(segs[1].0, " plain");
    assert_eq!(segs[1].1.fg, None);
}

#[test]
fn scroll_region_drops_top_row_on_lf_at_bottom() {
    let mut m = ScreenModel::new();
    m.feed(b"\x1b[1;3r"); // region rows 0..=2
    m.feed(b"one\ntwo\nthree\nfour\n");
    let snap = m.snapshot(10);
    assert!(!snap.lines.iter().any(|l| l == "one"));
    assert!(snap.lines.iter().any(|l| l == "four"));
}

#[test]
fn rows_capped_at_max_rows() {
    let mut m = ScreenModel::new();
    for _ in 0..(MAX_ROWS + 50) {
        m.feed(b"x\n");
    }
    assert!(m.row_count() <= MAX_ROWS);
}

#[test]
fn utf8_split_across_feed_calls() {
    let mut m = ScreenModel::new();
    let bytes = "é".as_bytes();
    m.feed(&bytes[..1]);
    m.feed(&bytes[1..]);
    let snap = m.snapshot(10);
    assert_eq!(snap.lines[0], "é");
}

#[test]
fn csi_split_across_feed_calls() {
    let mut m = ScreenModel::new();
    m.feed(b"\x1b[3");
    m.feed(b"1mred");
    let snap = m.snapshot(10);
    assert_eq!(snap.styled_lines[0][0].1.fg.as_deref(), Some("#800000"));
}

#[test]
fn revision_is_monotonic() {
    let mut m = ScreenModel::new();
    let r0 = m.revision();
    m.feed(b"hello");
    let r1 = m.revision();
    m.feed(b" world");
    let r2 = m.revision();
    assert!(r1 > r0);
    assert!(r2 > r1);
}

#[test]
fn charset_designator_does_not_leak_trailing_letter() {
    let mut m = ScreenModel::new();
    m.feed(b"alpha\x1b(Bbeta");
    let snap = m.snapshot(10);
    assert_eq!(snap.lines[0], "alphabeta");
}

// -- property tests (§8 P6-P9): randomized inputs over the fixed examples
// above, since this crate's `proptest` dev-dependency otherwise sits idle.

use proptest::prelude::*;

fn plain_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('a', 'z'), 1..8)
        .prop_map(|cs| cs.into_iter().collect())
}

proptest! {
    /// P6: a `\r` anywhere in a line always returns the cursor to column 0,
    /// so a second run of text overwrites the first run byte-for-byte
    /// while anything past the overwritten span survives unchanged.
    #[test]
    fn p6_cr_overwrite_prop(head in plain_text(), tail in plain_text()) {
        let mut m = ScreenModel::new();
        let mut input = head.clone().into_bytes();
        input.push(b'\r');
        input.extend_from_slice(tail.as_bytes());
        input.push(b'\n');
        m.feed(&input);
        let line = m.snapshot(10).lines[0].clone();

        let mut expected: Vec<char> = head.chars().collect();
        for (i, ch) in tail.chars().enumerate() {
            if i < expected.len() {
                expected[i] = ch;
            } else {
                expected.push(ch);
            }
        }
        prop_assert_eq!(line, expected.into_iter().collect::<String>());
    }

    /// P7: whatever is written while the alt screen is active never
    /// affects the primary buffer rows captured before entry, regardless
    /// of what that content is.
    #[test]
    fn p7_alt_screen_restores_prop(primary in plain_text(), alt in plain_text()) {
        let mut m = ScreenModel::new();
        m.feed(format!("{primary}\n").as_bytes());
        let before = m.snapshot(10).lines;

        m.feed(b"\x1b[?1049h");
        m.feed(format!("{alt}\nmore {alt}\n").as_bytes());
        prop_assert!(m.is_alt_screen());
        m.feed(b"\x1b[?1049l");
        prop_assert!(!m.is_alt_screen());

        let after = m.snapshot(10).lines;
        prop_assert_eq!(before, after);
    }

    /// P8: a tmux DCS passthrough's inner content renders exactly as if
    /// it had been written directly, for arbitrary plain-text payloads.
    #[test]
    fn p8_tmux_dcs_passthrough_prop(inner in plain_text()) {
        let mut direct = ScreenModel::new();
        direct.feed(format!("{inner}\n").as_bytes());
        let direct_lines = direct.snapshot(10).lines;

        let mut wrapped = ScreenModel::new();
        let mut framed = b"\x1bPtmux;".to_vec();
        for b in inner.as_bytes() {
            framed.push(*b);
        }
        framed.extend_from_slice(b"\n\x1b\\");
        wrapped.feed(&framed);
        let wrapped_lines = wrapped.snapshot(10).lines;

        prop_assert_eq!(direct_lines, wrapped_lines);
    }

    /// P9: an ANSI-16 SGR color always resolves to its fixed palette entry
    /// and the colored run coalesces into its own styled segment distinct
    /// from trailing unstyled text.
    #[test]
    fn p9_sgr_color_segment_prop(index in 0u8..8, text in plain_text(), tail in plain_text()) {
        let mut m = ScreenModel::new();
        let input = format!("\x1b[{}m{text}\x1b[0m{tail}", 30 + index);
        m.feed(input.as_bytes());
        let snap = m.snapshot(10);
        let segs = &snap.styled_lines[0];

        prop_assert_eq!(&segs[0].0, &text);
        prop_assert_eq!(segs[0].1.fg.as_deref(), Some(crate::palette::ansi16(index).as_str()));
        if !tail.is_empty() {
            prop_assert_eq!(&segs[1].0, &tail);
            prop_assert_eq!(segs[1].1.fg, None);
        }
    }
}
