//! Cursor position and internal scrolling for the compose box.
//!
//! `CursorState` owns the cursor byte offset, scroll offset and cached width.
//! Every method takes the buffer explicitly; the text belongs to `InputBox`.

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

use super::text_wrap::{CONTENT_OFFSET_X, CONTENT_OFFSET_Y, inner_width, wrap_options};

/// Byte range `(start, end)` of each wrapped line within `buffer`.
///
/// Wrapped lines are substrings of the buffer with the separators trimmed,
/// so each one is located by searching forward from the previous line's end.
fn line_spans(buffer: &str, width: u16) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;

    for line in textwrap::wrap(buffer, wrap_options(width)) {
        let start = offset + buffer[offset..].find(line.as_ref()).unwrap_or(0);
        let end = start + line.len();
        spans.push((start, end));

        offset = end;
        let rest = &buffer[offset..];
        let spaces = rest.len() - rest.trim_start_matches(' ').len();
        offset += spaces;
        if buffer[offset..].starts_with('\n') {
            offset += 1;
        }
    }

    if spans.is_empty() {
        spans.push((0, 0));
    }
    spans
}

pub(super) struct CursorState {
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    pub pos: usize,
    /// First visible wrapped line (0 when everything fits)
    pub scroll_offset: u16,
    /// Box width from the last render (used for vertical movement)
    pub last_width: u16,
}

impl CursorState {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
            last_width: Self::DEFAULT_WIDTH,
        }
    }

    /// Put the cursor at the end of a replaced buffer.
    pub fn move_to_end(&mut self, buffer: &str) {
        self.pos = buffer.len();
        self.scroll_offset = 0;
    }

    /// Index of the wrapped line holding the cursor, and the line's span.
    fn locate(&self, buffer: &str, width: u16) -> (usize, (usize, usize)) {
        let spans = line_spans(buffer, width);
        let index = spans
            .iter()
            .rposition(|(start, _)| *start <= self.pos)
            .unwrap_or(0);
        (index, spans[index])
    }

    /// Move one wrapped line up (`-1`) or down (`1`), keeping the column if possible.
    /// Returns `false` at the first/last line.
    pub fn move_vertically(&mut self, buffer: &str, direction: i16, box_width: u16) -> bool {
        let width = inner_width(box_width);
        if width == 0 || buffer.is_empty() {
            return false;
        }

        let spans = line_spans(buffer, width);
        let (index, (start, end)) = self.locate(buffer, width);
        let column = self.pos.min(end) - start;

        let target = match direction {
            d if d < 0 && index > 0 => index - 1,
            d if d > 0 && index + 1 < spans.len() => index + 1,
            _ => return false,
        };

        let (t_start, t_end) = spans[target];
        let mut pos = (t_start + column).min(t_end);
        while !buffer.is_char_boundary(pos) {
            pos -= 1;
        }
        self.pos = pos;
        true
    }

    /// Keep the cursor's line inside a window of `visible_lines` lines.
    pub fn update_scroll_offset(&mut self, buffer: &str, box_width: u16, visible_lines: u16) {
        let width = inner_width(box_width);
        if width == 0 || visible_lines == 0 {
            self.scroll_offset = 0;
            return;
        }

        let total = line_spans(buffer, width).len() as u16;
        if total <= visible_lines {
            self.scroll_offset = 0;
            return;
        }

        let line = self.locate(buffer, width).0 as u16;
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + visible_lines {
            self.scroll_offset = line + 1 - visible_lines;
        }
        self.scroll_offset = self.scroll_offset.min(total - visible_lines);
    }

    /// Screen `(column, row)` of the cursor inside `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        let origin = (area.x + CONTENT_OFFSET_X, area.y + CONTENT_OFFSET_Y);
        if width == 0 {
            return origin;
        }

        let (index, (start, _)) = self.locate(buffer, width);
        let column = (buffer[start..self.pos].width() as u16).min(width);
        let row = (index as u16).saturating_sub(self.scroll_offset);

        (origin.0 + column, origin.1 + row)
    }
}
