// SPDX-License-Identifier: MIT

//! The VT-subset screen reconstructor: a growing rectangular cell grid fed
//! byte-by-byte from a PTY stream. See the crate docs for scope.

use crate::palette;
use crate::style::Style;

/// Hard cap on retained rows (§3 invariant).
pub const MAX_ROWS: usize = 320;
/// Hard cap on column width (§3 invariant).
pub const MAX_COLS: usize = 260;

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    ch: char,
    style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell { ch: ' ', style: Style::default() }
    }
}

type Row = Vec<Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

/// A point-in-time capture of a window onto the grid.
#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub lines: Vec<String>,
    /// Per-row runs of cells sharing one style: `(text, style)`.
    pub styled_lines: Vec<Vec<(String, Style)>>,
    /// Cursor position relative to the returned window.
    pub cursor: CursorPosition,
    pub revision: u64,
    /// True if rows above the window were dropped from the response.
    pub truncated: bool,
}

#[derive(Debug, Clone)]
struct SavedBuffer {
    rows: Vec<Row>,
    cursor_row: usize,
    cursor_col: usize,
    style: Style,
    scroll_region: Option<(usize, usize)>,
}

/// Parsed state of a single session's terminal screen.
pub struct ScreenModel {
    rows: Vec<Row>,
    cursor_row: usize,
    cursor_col: usize,
    /// Explicit DECSTBM scroll region, inclusive `(top, bottom)`. `None`
    /// means the region tracks the whole current buffer.
    scroll_region: Option<(usize, usize)>,
    style: Style,
    alt_screen: bool,
    saved: Option<SavedBuffer>,
    /// Bytes left over from an incomplete escape sequence or UTF-8
    /// sequence at the end of the previous `feed()` call.
    pending: Vec<u8>,
    revision: u64,
}

impl Default for ScreenModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenModel {
    pub fn new() -> Self {
        Self {
            rows: vec![Row::new()],
            cursor_row: 0,
            cursor_col: 0,
            scroll_region: None,
            style: Style::default(),
            alt_screen: false,
            saved: None,
            pending: Vec::new(),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_alt_screen(&self) -> bool {
        self.alt_screen
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Feed raw PTY bytes into the model, updating the grid and bumping
    /// `revision` if anything changed.
    pub fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let owned;
        let input: &[u8] = if self.pending.is_empty() {
            data
        } else {
            owned = [self.pending.as_slice(), data].concat();
            &owned
        };
        self.pending.clear();

        let (leftover, changed) = self.run(input);
        self.pending = leftover;
        if changed {
            self.revision += 1;
        }
        self.trim_rows();
    }

    /// Capture the last `limit` rows as a point-in-time snapshot.
    pub fn snapshot(&self, limit: usize) -> ScreenSnapshot {
        let limit = limit.max(1);
        let total = self.rows.len();
        let start = total.saturating_sub(limit);
        let window = &self.rows[start..];

        let mut lines = Vec::with_capacity(window.len());
        let mut styled_lines = Vec::with_capacity(window.len());
        for row in window {
            let cells = visible_cells(row);
            lines.push(cells.iter().map(|c| c.ch).collect());
            styled_lines.push(coalesce_segments(&cells));
        }

        ScreenSnapshot {
            lines,
            styled_lines,
            cursor: CursorPosition {
                row: self.cursor_row.saturating_sub(start).min(u16::MAX as usize) as u16,
                col: self.cursor_col.min(u16::MAX as usize) as u16,
            },
            revision: self.revision,
            truncated: start > 0,
        }
    }

    // -- core byte-stream scanner --------------------------------------

    /// Scan `input`, applying effects as it goes. Returns any trailing
    /// bytes that form an incomplete sequence (to be buffered for the
    /// next call) and whether anything changed.
    fn run(&mut self, input: &[u8]) -> (Vec<u8>, bool) {
        let mut i = 0;
        let mut changed = false;

        while i < input.len() {
            let b = input[i];

            if b == 0x1b {
                if input.len() - i < 2 {
                    return (input[i..].to_vec(), changed);
                }
                match input[i + 1] {
                    b'[' => match find_csi_final(&input[i + 2..]) {
                        Some(final_off) => {
                            let final_byte = input[i + 2 + final_off];
                            let params = input[i + 2..i + 2 + final_off].to_vec();
                            self.handle_csi(&params, final_byte);
                            i += 2 + final_off + 1;
                            changed = true;
                        }
                        None => return (input[i..].to_vec(), changed),
                    },
                    b'P' => match find_st(&input[i + 2..]) {
                        Some((body_len, term_len)) => {
                            let body = &input[i + 2..i + 2 + body_len];
                            if let Some(rest) = body.strip_prefix(b"tmux;".as_slice()) {
                                let unescaped = unescape_tmux(rest);
                                let (_, sub_changed) = self.run(&unescaped);
                                changed = changed || sub_changed;
                            }
                            i += 2 + body_len + term_len;
                        }
                        None => return (input[i..].to_vec(), changed),
                    },
                    b']' | b'^' | b'_' => match find_st(&input[i + 2..]) {
                        Some((body_len, term_len)) => {
                            i += 2 + body_len + term_len;
                        }
                        None => return (input[i..].to_vec(), changed),
                    },
                    b'(' | b')' | b'*' | b'+' | b'-' | b'.' | b'/' | b'X' => {
                        if input.len() - i < 3 {
                            return (input[i..].to_vec(), changed);
                        }
                        i += 3;
                    }
                    _ => i += 2,
                }
                continue;
            }

            match b {
                b'\r' => {
                    self.cursor_col = 0;
                    i += 1;
                    changed = true;
                }
                b'\n' => {
                    self.advance_row();
                    i += 1;
                    changed = true;
                }
                0x08 | 0x7f => {
                    self.cursor_col = self.cursor_col.saturating_sub(1);
                    i += 1;
                    changed = true;
                }
                0x09 => {
                    self.tab();
                    i += 1;
                    changed = true;
                }
                b if b < 0x20 => {
                    i += 1;
                }
                _ => match decode_char(input, i) {
                    Some((ch, len)) => {
                        self.write_rune(ch);
                        i += len;
                        changed = true;
                    }
                    None => return (input[i..].to_vec(), changed),
                },
            }
        }

        (Vec::new(), changed)
    }

    // -- cursor & grid primitives ----------------------------------------

    fn ensure_row(&mut self, row: usize) {
        while self.rows.len() <= row {
            self.rows.push(Row::new());
        }
    }

    fn ensure_col(&mut self, row: usize, col: usize) {
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(Cell::default());
        }
    }

    fn effective_scroll_region(&self) -> (usize, usize) {
        self.scroll_region.unwrap_or((0, self.rows.len().saturating_sub(1)))
    }

    /// `LF`'s row-advance behavior: used both by the control character
    /// (which preserves the column) and by auto-wrap (caller resets the
    /// column separately).
    fn advance_row(&mut self) {
        let (top, bottom) = self.effective_scroll_region();
        if self.cursor_row < bottom {
            self.cursor_row += 1;
            self.ensure_row(self.cursor_row);
        } else {
            self.scroll_up_region(top, bottom, 1);
            self.cursor_row = bottom;
        }
    }

    fn scroll_up_region(&mut self, top: usize, bottom: usize, n: usize) {
        if top >= bottom || bottom >= self.rows.len() {
            return;
        }
        for _ in 0..n {
            self.rows.remove(top);
            let insert_at = bottom.min(self.rows.len());
            self.rows.insert(insert_at, Row::new());
        }
    }

    fn write_rune(&mut self, ch: char) {
        if self.cursor_col >= MAX_COLS {
            self.advance_row();
            self.cursor_col = 0;
        }
        self.ensure_row(self.cursor_row);
        self.ensure_col(self.cursor_row, self.cursor_col);
        self.rows[self.cursor_row][self.cursor_col] = Cell { ch, style: self.style.clone() };
        self.cursor_col += 1;
    }

    fn tab(&mut self) {
        let target = ((self.cursor_col / 4) + 1) * 4;
        while self.cursor_col < target && self.cursor_col < MAX_COLS {
            self.write_rune(' ');
        }
    }

    // -- CSI dispatch ------------------------------------------------------

    fn handle_csi(&mut self, params_bytes: &[u8], final_byte: u8) {
        let (private, params) = parse_params(params_bytes);
        match final_byte {
            b'A' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_row = self.cursor_row.saturating_sub(n);
            }
            b'B' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_row += n;
                self.ensure_row(self.cursor_row);
            }
            b'C' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_col = (self.cursor_col + n).min(MAX_COLS - 1);
            }
            b'D' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_col = self.cursor_col.saturating_sub(n);
            }
            b'E' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_row += n;
                self.cursor_col = 0;
                self.ensure_row(self.cursor_row);
            }
            b'F' => {
                let n = p(&params, 0, 1) as usize;
                self.cursor_row = self.cursor_row.saturating_sub(n);
                self.cursor_col = 0;
            }
            b'G' => {
                let col = (p(&params, 0, 1) - 1).max(0) as usize;
                self.cursor_col = col.min(MAX_COLS - 1);
            }
            b'H' | b'f' => {
                let row = (p(&params, 0, 1) - 1).max(0) as usize;
                let col = (p(&params, 1, 1) - 1).max(0) as usize;
                self.cursor_row = row;
                self.ensure_row(row);
                self.cursor_col = col.min(MAX_COLS - 1);
            }
            b'J' => self.erase_display(p(&params, 0, 0)),
            b'K' => self.erase_line(p(&params, 0, 0)),
            b'X' => self.erase_chars(p(&params, 0, 1) as usize),
            b'S' => {
                let n = p(&params, 0, 1) as usize;
                let (top, bottom) = self.effective_scroll_region();
                self.scroll_up_region(top, bottom, n);
            }
            b'd' => {
                let row = (p(&params, 0, 1) - 1).max(0) as usize;
                self.cursor_row = row;
                self.ensure_row(row);
            }
            b'r' => self.set_scroll_region(&params),
            b'h' if private => self.set_private_modes(&params, true),
            b'l' if private => self.set_private_modes(&params, false),
            b'm' => self.apply_sgr(&params),
            _ => {}
        }
    }

    fn erase_display(&mut self, mode: i64) {
        let (row, col) = (self.cursor_row, self.cursor_col);
        match mode {
            0 => {
                if row < self.rows.len() {
                    self.rows[row].truncate(col.min(self.rows[row].len()));
                }
                self.rows.truncate(row + 1);
            }
            1 => {
                for r in self.rows.iter_mut().take(row) {
                    r.clear();
                }
                if row < self.rows.len() {
                    let end = col.min(self.rows[row].len());
                    for cell in self.rows[row][..end].iter_mut() {
                        *cell = Cell::default();
                    }
                }
            }
            2 => {
                for r in self.rows.iter_mut() {
                    r.clear();
                }
                // §4.5: erasing the entire screen also resets the
                // alt-screen save state.
                self.saved = None;
            }
            _ => {}
        }
    }

    fn erase_line(&mut self, mode: i64) {
        self.ensure_row(self.cursor_row);
        let row = &mut self.rows[self.cursor_row];
        let col = self.cursor_col;
        match mode {
            0 => {
                if col < row.len() {
                    row.truncate(col);
                }
            }
            1 => {
                let end = col.min(row.len());
                for cell in row[..end].iter_mut() {
                    *cell = Cell::default();
                }
            }
            2 => row.clear(),
            _ => {}
        }
    }

    fn erase_chars(&mut self, n: usize) {
        self.ensure_row(self.cursor_row);
        for off in 0..n {
            let col = self.cursor_col + off;
            if col >= MAX_COLS {
                break;
            }
            self.ensure_col(self.cursor_row, col);
            self.rows[self.cursor_row][col] = Cell::default();
        }
    }

    fn set_scroll_region(&mut self, params: &[i64]) {
        let top = (params.first().copied().unwrap_or(0).max(1) - 1).max(0) as usize;
        let bottom_param = params.get(1).copied().unwrap_or(0);
        let bottom = if bottom_param <= 0 {
            self.rows.len().saturating_sub(1)
        } else {
            (bottom_param - 1).max(0) as usize
        };
        if top >= bottom {
            return;
        }
        self.ensure_row(bottom);
        self.scroll_region = Some((top, bottom));
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    fn set_private_modes(&mut self, params: &[i64], enable: bool) {
        for &code in params {
            if matches!(code, 47 | 1047 | 1049) {
                self.set_alt_screen(enable);
            }
        }
    }

    fn set_alt_screen(&mut self, enable: bool) {
        if enable && !self.alt_screen {
            self.saved = Some(SavedBuffer {
                rows: self.rows.clone(),
                cursor_row: self.cursor_row,
                cursor_col: self.cursor_col,
                style: self.style.clone(),
                scroll_region: self.scroll_region,
            });
            self.alt_screen = true;
            self.rows = vec![Row::new()];
            self.cursor_row = 0;
            self.cursor_col = 0;
            self.scroll_region = None;
        } else if !enable && self.alt_screen {
            if let Some(saved) = self.saved.take() {
                self.rows = saved.rows;
                self.cursor_row = saved.cursor_row;
                self.cursor_col = saved.cursor_col;
                self.style = saved.style;
                self.scroll_region = saved.scroll_region;
            }
            self.alt_screen = false;
        }
    }

    fn apply_sgr(&mut self, params: &[i64]) {
        let zero = [0i64];
        let params: &[i64] = if params.is_empty() { &zero } else { params };
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.style.reset(),
                1 => self.style.bold = true,
                3 => self.style.italic = true,
                4 => self.style.underline = true,
                22 => self.style.bold = false,
                23 => self.style.italic = false,
                24 => self.style.underline = false,
                39 => self.style.fg = None,
                49 => self.style.bg = None,
                n @ 30..=37 => self.style.fg = Some(palette::ansi16((n - 30) as u8)),
                n @ 90..=97 => self.style.fg = Some(palette::ansi16((n - 90 + 8) as u8)),
                n @ 40..=47 => self.style.bg = Some(palette::ansi16((n - 40) as u8)),
                n @ 100..=107 => self.style.bg = Some(palette::ansi16((n - 100 + 8) as u8)),
                38 | 48 => {
                    let is_fg = params[i] == 38;
                    match params.get(i + 1).copied() {
                        Some(5) => {
                            if let Some(&idx) = params.get(i + 2) {
                                let color = palette::ansi256(idx.clamp(0, 255) as u8);
                                if is_fg {
                                    self.style.fg = Some(color);
                                } else {
                                    self.style.bg = Some(color);
                                }
                            }
                            i += 2;
                        }
                        Some(2) => {
                            let r = params.get(i + 2).copied().unwrap_or(0).clamp(0, 255) as u8;
                            let g = params.get(i + 3).copied().unwrap_or(0).clamp(0, 255) as u8;
                            let b = params.get(i + 4).copied().unwrap_or(0).clamp(0, 255) as u8;
                            let color = palette::truecolor(r, g, b);
                            if is_fg {
                                self.style.fg = Some(color);
                            } else {
                                self.style.bg = Some(color);
                            }
                            i += 4;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn trim_rows(&mut self) {
        if self.rows.len() <= MAX_ROWS {
            return;
        }
        let excess = self.rows.len() - MAX_ROWS;
        self.rows.drain(0..excess);
        self.cursor_row = self.cursor_row.saturating_sub(excess);
        if let Some((top, bottom)) = self.scroll_region {
            let nt = top.saturating_sub(excess);
            let nb = bottom.saturating_sub(excess);
            self.scroll_region = if nt < nb { Some((nt, nb)) } else { None };
        }
    }
}

fn p(params: &[i64], idx: usize, default: i64) -> i64 {
    match params.get(idx) {
        Some(&0) | None => default,
        Some(&v) => v,
    }
}

fn parse_params(bytes: &[u8]) -> (bool, Vec<i64>) {
    let mut idx = 0;
    let private = bytes.first() == Some(&b'?');
    if private {
        idx = 1;
    }
    let s = std::str::from_utf8(&bytes[idx..]).unwrap_or("");
    let params = if s.is_empty() {
        Vec::new()
    } else {
        s.split(';').map(|part| part.parse::<i64>().unwrap_or(0)).collect()
    };
    (private, params)
}

/// Find the final byte (`0x40..=0x7e`) of a CSI sequence within `rest`
/// (the bytes after `ESC [`). Returns its offset within `rest`.
fn find_csi_final(rest: &[u8]) -> Option<usize> {
    rest.iter().position(|&b| (0x40..=0x7e).contains(&b))
}

/// Find the string terminator (`BEL` or `ESC \`) within `rest` (the bytes
/// after the introducer). Returns `(body_len, terminator_len)`.
fn find_st(rest: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == 0x07 {
            return Some((i, 1));
        }
        if rest[i] == 0x1b && i + 1 < rest.len() && rest[i + 1] == b'\\' {
            return Some((i, 2));
        }
        i += 1;
    }
    None
}

/// Unescape tmux DCS passthrough body: `ESC ESC` → `ESC`.
fn unescape_tmux(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == 0x1b && i + 1 < body.len() && body[i + 1] == 0x1b {
            out.push(0x1b);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    out
}

fn utf8_len(b: u8) -> usize {
    if b & 0x80 == 0 {
        1
    } else if b & 0xE0 == 0xC0 {
        2
    } else if b & 0xF0 == 0xE0 {
        3
    } else if b & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

fn decode_char(data: &[u8], i: usize) -> Option<(char, usize)> {
    let len = utf8_len(data[i]);
    if i + len > data.len() {
        return None;
    }
    match std::str::from_utf8(&data[i..i + len]) {
        Ok(s) => Some((s.chars().next().unwrap_or('\u{FFFD}'), len)),
        Err(_) => Some(('\u{FFFD}', 1)),
    }
}

/// Trailing default-style spaces trimmed, then the isolated-`B` guard
/// applied over what remains (§4.5, §9-4).
fn visible_cells(row: &[Cell]) -> Vec<Cell> {
    let mut end = row.len();
    while end > 0 && row[end - 1].ch == ' ' && row[end - 1].style == Style::default() {
        end -= 1;
    }
    let trimmed = &row[..end];

    let mut out = Vec::with_capacity(trimmed.len());
    for (idx, cell) in trimmed.iter().enumerate() {
        if cell.ch == 'B' {
            let left_ws = idx == 0 || trimmed[idx - 1].ch.is_whitespace();
            let right_ws = idx + 1 == trimmed.len() || trimmed[idx + 1].ch.is_whitespace();
            if left_ws && right_ws {
                continue;
            }
        }
        out.push(cell.clone());
    }
    out
}

fn coalesce_segments(cells: &[Cell]) -> Vec<(String, Style)> {
    let mut segments: Vec<(String, Style)> = Vec::new();
    for cell in cells {
        match segments.last_mut() {
            Some((text, style)) if *style == cell.style => text.push(cell.ch),
            _ => segments.push((cell.ch.to_string(), cell.style.clone())),
        }
    }
    segments
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
