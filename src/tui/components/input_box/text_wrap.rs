//! Wrapping helpers and dimensions for the compose box.
//!
//! Stateless; nothing here knows about `InputBox` or `CursorState`.

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Offset from area edge to content, horizontally (border + padding)
pub(super) const CONTENT_OFFSET_X: u16 = 2;
/// Offset from area edge to content, vertically (border)
pub(super) const CONTENT_OFFSET_Y: u16 = 1;

/// Textwrap options shared by height measurement, rendering and cursor math.
pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Inner content width of a box `content_width` columns wide; 0 when too narrow.
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Number of wrapped lines, counting a trailing newline as an empty last line.
pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }

    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);

    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }

    count
}

/// Natural height of the whole box: every wrapped line plus the borders.
pub(super) fn scroll_height(text: &str, box_width: u16) -> u16 {
    wrap_line_count(text, inner_width(box_width)) + VERTICAL_OVERHEAD
}

/// The wrapped lines `start..start + count` joined for display.
pub(super) fn visible_text(text: &str, box_width: u16, start: u16, count: u16) -> String {
    let width = inner_width(box_width);
    if width == 0 || count == 0 {
        return String::new();
    }
    textwrap::wrap(text, wrap_options(width))
        .iter()
        .skip(start as usize)
        .take(count as usize)
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
